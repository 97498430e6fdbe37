//! The simulated printer's observable state.
//!
//! [`PrinterState`] serializes to the exact document pushed to observers and
//! returned by the snapshot query, so field names follow the wire format.

use serde::{Deserialize, Serialize};

/// Externally visible printer status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterStatus {
    Idle,
    Homing,
    Printing,
}

impl std::fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrinterStatus::Idle => "Idle",
            PrinterStatus::Homing => "Homing",
            PrinterStatus::Printing => "Printing",
        };
        f.write_str(name)
    }
}

/// Current heater readings in °C.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub hotend: f64,
    pub bed: f64,
}

/// Samples recorded once per printing tick.
///
/// The four series are only ever extended together through [`TempHistory::record`],
/// which keeps them the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempHistory {
    timestamps: Vec<String>,
    extruder_data: Vec<f64>,
    bed_data: Vec<f64>,
    pi_data: Vec<f64>,
}

impl TempHistory {
    pub fn record(&mut self, timestamp: String, hotend: f64, bed: f64, aux: f64) {
        self.timestamps.push(timestamp);
        self.extruder_data.push(hotend);
        self.bed_data.push(bed);
        self.pi_data.push(aux);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[String] {
        &self.timestamps
    }

    pub fn extruder_data(&self) -> &[f64] {
        &self.extruder_data
    }

    pub fn bed_data(&self) -> &[f64] {
        &self.bed_data
    }

    pub fn pi_data(&self) -> &[f64] {
        &self.pi_data
    }

    /// True when all four series have the same length.
    pub fn is_aligned(&self) -> bool {
        let n = self.timestamps.len();
        self.extruder_data.len() == n && self.bed_data.len() == n && self.pi_data.len() == n
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterState {
    pub status: PrinterStatus,
    pub print_progress: f64,
    pub temperature: Temperature,
    pub temp_history: TempHistory,
}

impl PrinterState {
    /// Idle printer sitting at ambient temperature with no history.
    pub fn new(ambient: f64) -> Self {
        Self {
            status: PrinterStatus::Idle,
            print_progress: 0.0,
            temperature: Temperature {
                hotend: ambient,
                bed: ambient,
            },
            temp_history: TempHistory::default(),
        }
    }
}

impl Default for PrinterState {
    fn default() -> Self {
        Self::new(25.0)
    }
}
