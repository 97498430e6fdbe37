//! Defines the communication channel messages between the web layer and the printer task.

use tokio::sync::oneshot;

use super::hub::ObserverHandle;
use crate::printer::{PrinterCommand, PrinterError, PrinterState};

/// Represents a request sent from the web layer to the printer task.
#[derive(Debug)]
pub enum PrinterRequest {
    /// A request for the current printer state.
    GetState {
        /// The channel to send the response back on.
        respond_to: oneshot::Sender<PrinterState>,
    },
    /// Register an observer and send it the current state. Handled on the
    /// printer task so no broadcast can slip in between the two.
    Attach {
        observer: ObserverHandle,
        respond_to: oneshot::Sender<()>,
    },
    /// Apply a command to the state machine.
    Command {
        command: PrinterCommand,
        respond_to: oneshot::Sender<Result<(), PrinterError>>,
    },
}
