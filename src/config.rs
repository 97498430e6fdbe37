//! Configuration for the simulator process.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [server]
//! port = 3000
//! static_dir = "public"
//!
//! [simulation]
//! tick_interval_ms = 1000
//! homing_delay_ms = 5000
//! hotend_target = 200.0
//! bed_target = 60.0
//! ```
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock simulator behaviour.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory of static assets served for any unmatched path.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

/// Timing and thermal parameters of the simulated printer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub printer_name: Option<String>,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_homing_delay_ms")]
    pub homing_delay_ms: u64,
    #[serde(default = "default_ambient_temp")]
    pub ambient_temp: f64,
    #[serde(default = "default_hotend_target")]
    pub hotend_target: f64,
    #[serde(default = "default_bed_target")]
    pub bed_target: f64,
    #[serde(default = "default_hotend_step")]
    pub hotend_step: f64,
    #[serde(default = "default_bed_step")]
    pub bed_step: f64,
    #[serde(default = "default_progress_step")]
    pub progress_step: f64,
    /// Reading recorded for the auxiliary (host board) sensor on every printing tick.
    #[serde(default = "default_aux_sensor_temp")]
    pub aux_sensor_temp: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            printer_name: None,
            tick_interval_ms: default_tick_interval_ms(),
            homing_delay_ms: default_homing_delay_ms(),
            ambient_temp: default_ambient_temp(),
            hotend_target: default_hotend_target(),
            bed_target: default_bed_target(),
            hotend_step: default_hotend_step(),
            bed_step: default_bed_step(),
            progress_step: default_progress_step(),
            aux_sensor_temp: default_aux_sensor_temp(),
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn homing_delay(&self) -> Duration {
        Duration::from_millis(self.homing_delay_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be > 0".to_string());
        }
        if self.homing_delay_ms == 0 {
            return Err("homing_delay_ms must be > 0".to_string());
        }
        for (name, value) in [
            ("ambient_temp", self.ambient_temp),
            ("hotend_target", self.hotend_target),
            ("bed_target", self.bed_target),
            ("hotend_step", self.hotend_step),
            ("bed_step", self.bed_step),
            ("progress_step", self.progress_step),
            ("aux_sensor_temp", self.aux_sensor_temp),
        ] {
            if !value.is_finite() {
                return Err(format!("{} must be a finite number", name));
            }
        }
        for (name, step) in [
            ("hotend_step", self.hotend_step),
            ("bed_step", self.bed_step),
            ("progress_step", self.progress_step),
        ] {
            if step <= 0.0 {
                return Err(format!("{} must be > 0", name));
            }
        }
        if self.hotend_target < self.ambient_temp {
            return Err("hotend_target must not be below ambient_temp".to_string());
        }
        if self.bed_target < self.ambient_temp {
            return Err("bed_target must not be below ambient_temp".to_string());
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be > 0".to_string()));
        }
        self.simulation.validate().map_err(ConfigError::Invalid)
    }

    /// Applies the `PORT` environment variable, if it holds a valid port.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
fn default_tick_interval_ms() -> u64 { 1000 }
fn default_homing_delay_ms() -> u64 { 5000 }
fn default_ambient_temp() -> f64 { 25.0 }
fn default_hotend_target() -> f64 { 200.0 }
fn default_bed_target() -> f64 { 60.0 }
fn default_hotend_step() -> f64 { 5.0 }
fn default_bed_step() -> f64 { 2.0 }
fn default_progress_step() -> f64 { 0.1 }
fn default_aux_sensor_temp() -> f64 { 44.0 }

/// Parses and validates a configuration document.
pub fn parse_config(contents: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents),
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            Err(ConfigError::Io(e))
        }
    }
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(path: &str) -> Result<Config, ConfigError> {
    if !std::path::Path::new(path).exists() {
        tracing::warn!("Config file '{}' not found, using defaults", path);
        return Ok(Config::default());
    }
    load_config(path)
}
