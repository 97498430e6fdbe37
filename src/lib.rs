//! Real-time 3D printer simulator.
//!
//! A single simulated printer heats, prints and homes on timers, and every
//! state change is pushed to all connected observers.

pub mod config;
pub mod printer;
pub mod service;
pub mod web;

pub use config::{Config, ConfigError, ServerConfig, SimulationConfig};
pub use printer::{PrinterCommand, PrinterError, PrinterState, PrinterStatus};
pub use service::spawn_printer;
pub use web::hub::BroadcastHub;
