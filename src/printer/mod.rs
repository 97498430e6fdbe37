//! Printer simulation core: state model, timers and the state machine that
//! owns every mutation of the printer state.

pub mod clock;
pub mod machine;
pub mod state;

pub use clock::{ClockTick, SimulationClock, TimerKind};
pub use machine::PrinterStateMachine;
pub use state::{PrinterState, PrinterStatus, TempHistory, Temperature};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrinterError {
    #[error("Printer is busy")]
    Busy,
    #[error("Malformed command: {0}")]
    MalformedCommand(String),
    #[error("Printer task is not running")]
    ChannelClosed,
}

/// Commands an observer may issue against the printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterCommand {
    StartPrint { name: String },
    CancelPrint,
    StartHoming,
}

/// Receives every snapshot the state machine publishes, in mutation order.
pub trait SnapshotSink: Send + Sync + 'static {
    fn publish(&self, state: &PrinterState);
}
