//! The web module: push channel, HTTP API and the observer hub.
//! This file declares the other files in this directory as sub-modules.

pub mod api;
pub mod hub;
pub mod models;
pub mod printer_channel;
pub mod ws;
