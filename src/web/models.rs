//! Contains the data models for push-channel events and API requests.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::printer::{PrinterCommand, PrinterError, PrinterState};

/// Events pushed from the printer to an observer.
///
/// Serialized as `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    PrinterState(Arc<PrinterState>),
    Error { message: String },
}

impl ServerEvent {
    pub fn error(err: &PrinterError) -> Self {
        ServerEvent::Error { message: err.to_string() }
    }
}

/// Commands received from an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    StartPrint(StartPrintRequest),
    CancelPrint,
    StartHoming,
}

#[derive(Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl ClientCommand {
    /// Decodes a `{"event": ..., "data": ...}` text frame.
    pub fn from_frame(text: &str) -> Result<Self, PrinterError> {
        let frame: RawFrame = serde_json::from_str(text)
            .map_err(|e| PrinterError::MalformedCommand(e.to_string()))?;
        match frame.event.as_str() {
            "startPrint" => {
                let request = if frame.data.is_null() {
                    StartPrintRequest::default()
                } else {
                    serde_json::from_value(frame.data)
                        .map_err(|e| PrinterError::MalformedCommand(format!("startPrint: {}", e)))?
                };
                Ok(ClientCommand::StartPrint(request))
            }
            "cancelPrint" => Ok(ClientCommand::CancelPrint),
            "startHoming" => Ok(ClientCommand::StartHoming),
            other => Err(PrinterError::MalformedCommand(format!("unknown event '{}'", other))),
        }
    }
}

impl From<ClientCommand> for PrinterCommand {
    fn from(command: ClientCommand) -> Self {
        match command {
            ClientCommand::StartPrint(request) => PrinterCommand::StartPrint { name: request.name },
            ClientCommand::CancelPrint => PrinterCommand::CancelPrint,
            ClientCommand::StartHoming => PrinterCommand::StartHoming,
        }
    }
}

/// Payload of a print request. Only the job name is read; other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPrintRequest {
    #[serde(default = "default_job_name")]
    pub name: String,
}

impl Default for StartPrintRequest {
    fn default() -> Self {
        Self { name: default_job_name() }
    }
}

fn default_job_name() -> String {
    "untitled".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printer_state_event_shape() {
        let event = ServerEvent::PrinterState(Arc::new(PrinterState::default()));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "printerState");
        assert_eq!(json["data"]["status"], "Idle");
        assert!(json["data"]["tempHistory"]["piData"].is_array());
    }

    #[test]
    fn error_event_shape() {
        let json = serde_json::to_value(ServerEvent::error(&PrinterError::Busy)).unwrap();
        assert_eq!(json, serde_json::json!({"event": "error", "data": {"message": "Printer is busy"}}));
    }

    #[test]
    fn decodes_start_print_with_extra_fields() {
        let command = ClientCommand::from_frame(
            r#"{"event":"startPrint","data":{"name":"benchy.gcode","material":"PLA"}}"#,
        )
        .unwrap();
        assert_eq!(
            command,
            ClientCommand::StartPrint(StartPrintRequest { name: "benchy.gcode".to_string() })
        );
    }

    #[test]
    fn start_print_without_payload_uses_default_name() {
        let command = ClientCommand::from_frame(r#"{"event":"startPrint"}"#).unwrap();
        assert_eq!(command, ClientCommand::StartPrint(StartPrintRequest::default()));
    }

    #[test]
    fn decodes_payloadless_commands() {
        assert_eq!(ClientCommand::from_frame(r#"{"event":"cancelPrint"}"#).unwrap(), ClientCommand::CancelPrint);
        assert_eq!(
            ClientCommand::from_frame(r#"{"event":"startHoming","data":null}"#).unwrap(),
            ClientCommand::StartHoming
        );
    }

    #[test]
    fn rejects_malformed_frames() {
        for text in ["not json", r#"{"data":{}}"#, r#"{"event":"explode"}"#, r#"{"event":"startPrint","data":{"name":7}}"#] {
            let err = ClientCommand::from_frame(text).unwrap_err();
            assert!(matches!(err, PrinterError::MalformedCommand(_)), "{}", text);
        }
    }
}
