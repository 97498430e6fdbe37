//! Observer registry and command routing.
//!
//! [`ObserverRegistry`] is the set of connected observers and is the
//! [`SnapshotSink`] the state machine publishes into. [`BroadcastHub`] is the
//! front door used by transports: it attaches observers, routes their
//! commands to the printer task and replies to the originating observer when
//! a command is rejected.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::models::{ClientCommand, ServerEvent};
use super::printer_channel::PrinterRequest;
use crate::printer::{PrinterCommand, PrinterError, PrinterState, SnapshotSink};

pub type ObserverId = Uuid;

/// Handle for sending events to one observer.
#[derive(Debug, Clone)]
pub struct ObserverHandle {
    id: ObserverId,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ObserverHandle {
    /// Creates a handle with a fresh id and the receiving end of its queue.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { id: Uuid::new_v4(), sender }, receiver)
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Queues an event. Returns false once the observer has gone away.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObserverRegistry {
    observers: Arc<RwLock<HashMap<ObserverId, ObserverHandle>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: ObserverHandle) {
        let id = observer.id();
        self.write().insert(id, observer);
        tracing::info!(observer_id = %id, "Observer connected");
    }

    /// Removes an observer. Returns whether it was registered.
    pub fn deregister(&self, id: &ObserverId) -> bool {
        let removed = self.write().remove(id).is_some();
        if removed {
            tracing::info!(observer_id = %id, "Observer disconnected");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Sends a snapshot to every registered observer, best effort. The
    /// snapshot is shared between observers rather than copied per queue.
    /// Returns the number of observers it was queued for.
    pub fn broadcast(&self, state: &PrinterState) -> usize {
        self.send_all(&ServerEvent::PrinterState(Arc::new(state.clone())))
    }

    /// Sends an event to every registered observer.
    pub fn send_all(&self, event: &ServerEvent) -> usize {
        let observers = self.read();
        let sent = observers
            .values()
            .filter(|observer| observer.send(event.clone()))
            .count();
        tracing::trace!(observers = observers.len(), sent, "Broadcast event");
        sent
    }

    /// Sends an event to one observer. Returns false if it is not registered
    /// or has gone away.
    pub fn send_to(&self, id: &ObserverId, event: ServerEvent) -> bool {
        self.read().get(id).is_some_and(|observer| observer.send(event))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ObserverId, ObserverHandle>> {
        self.observers.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ObserverId, ObserverHandle>> {
        self.observers.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotSink for ObserverRegistry {
    fn publish(&self, state: &PrinterState) {
        self.broadcast(state);
    }
}

#[derive(Debug, Clone)]
pub struct BroadcastHub {
    registry: ObserverRegistry,
    printer_tx: mpsc::Sender<PrinterRequest>,
}

impl BroadcastHub {
    pub fn new(registry: ObserverRegistry, printer_tx: mpsc::Sender<PrinterRequest>) -> Self {
        Self { registry, printer_tx }
    }

    pub fn registry(&self) -> &ObserverRegistry {
        &self.registry
    }

    /// Registers the observer and sends it the current snapshot.
    pub async fn on_connect(&self, observer: ObserverHandle) -> Result<(), PrinterError> {
        let (respond_to, response) = oneshot::channel();
        self.request(PrinterRequest::Attach { observer, respond_to }).await?;
        response.await.map_err(|_| PrinterError::ChannelClosed)
    }

    /// Routes an observer's command to the printer. A rejected command is
    /// reported to that observer only, then returned to the caller.
    pub async fn on_command(&self, observer: &ObserverId, command: ClientCommand) -> Result<(), PrinterError> {
        let result = self.execute(command.into()).await;
        if let Err(err @ PrinterError::Busy) = &result {
            self.reply_error(observer, err);
        }
        result
    }

    /// Decodes a raw frame from an observer and routes it. Undecodable frames
    /// are answered with an error event to that observer only.
    pub async fn on_frame(&self, observer: &ObserverId, text: &str) -> Result<(), PrinterError> {
        let command = match ClientCommand::from_frame(text) {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!(observer_id = %observer, error = %err, "Rejecting malformed command");
                self.reply_error(observer, &err);
                return Err(err);
            }
        };
        if let ClientCommand::StartPrint(request) = &command {
            tracing::info!(observer_id = %observer, job = %request.name, "Print requested");
        }
        self.on_command(observer, command).await
    }

    /// Sends an error event to one observer.
    pub fn reply_error(&self, observer: &ObserverId, err: &PrinterError) {
        if !self.registry.send_to(observer, ServerEvent::error(err)) {
            tracing::debug!(observer_id = %observer, "Could not deliver error to observer");
        }
    }

    /// Deregisters an observer. Safe to call more than once.
    pub fn on_disconnect(&self, observer: &ObserverId) {
        self.registry.deregister(observer);
    }

    /// Applies a command without an originating observer.
    pub async fn execute(&self, command: PrinterCommand) -> Result<(), PrinterError> {
        let (respond_to, response) = oneshot::channel();
        self.request(PrinterRequest::Command { command, respond_to }).await?;
        response.await.map_err(|_| PrinterError::ChannelClosed)?
    }

    pub async fn snapshot(&self) -> Result<PrinterState, PrinterError> {
        let (respond_to, response) = oneshot::channel();
        self.request(PrinterRequest::GetState { respond_to }).await?;
        response.await.map_err(|_| PrinterError::ChannelClosed)
    }

    async fn request(&self, request: PrinterRequest) -> Result<(), PrinterError> {
        self.printer_tx
            .send(request)
            .await
            .map_err(|_| PrinterError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_every_registered_observer() {
        let registry = ObserverRegistry::new();
        let (a, mut rx_a) = ObserverHandle::channel();
        let (b, mut rx_b) = ObserverHandle::channel();
        registry.register(a);
        registry.register(b);

        let mut state = PrinterState::default();
        state.temp_history.record("12:00".to_string(), 200.0, 60.0, 44.0);
        assert_eq!(registry.broadcast(&state), 2);

        let (ServerEvent::PrinterState(got_a), ServerEvent::PrinterState(got_b)) =
            (rx_a.try_recv().unwrap(), rx_b.try_recv().unwrap())
        else {
            panic!("expected printerState events");
        };
        assert_eq!(*got_a, state);
        assert!(Arc::ptr_eq(&got_a, &got_b));
    }

    #[test]
    fn broadcast_with_no_observers_is_not_an_error() {
        let registry = ObserverRegistry::new();
        assert_eq!(registry.broadcast(&PrinterState::default()), 0);
    }

    #[test]
    fn deregister_is_idempotent() {
        let registry = ObserverRegistry::new();
        let (a, _rx) = ObserverHandle::channel();
        let id = a.id();
        registry.register(a);

        assert!(registry.deregister(&id));
        assert!(!registry.deregister(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn dropped_observer_is_skipped() {
        let registry = ObserverRegistry::new();
        let (a, rx_a) = ObserverHandle::channel();
        let (b, mut rx_b) = ObserverHandle::channel();
        registry.register(a);
        registry.register(b);
        drop(rx_a);

        registry.publish(&PrinterState::default());
        assert!(rx_b.try_recv().is_ok());
        assert_eq!(registry.send_all(&ServerEvent::error(&PrinterError::Busy)), 1);
    }

    #[test]
    fn send_to_targets_one_observer() {
        let registry = ObserverRegistry::new();
        let (a, mut rx_a) = ObserverHandle::channel();
        let (b, mut rx_b) = ObserverHandle::channel();
        let id_a = a.id();
        registry.register(a);
        registry.register(b);

        assert!(registry.send_to(&id_a, ServerEvent::error(&PrinterError::Busy)));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
        assert!(!registry.send_to(&Uuid::new_v4(), ServerEvent::error(&PrinterError::Busy)));
    }

    #[tokio::test]
    async fn requests_fail_once_printer_task_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let hub = BroadcastHub::new(ObserverRegistry::new(), tx);
        assert_eq!(hub.snapshot().await.unwrap_err(), PrinterError::ChannelClosed);
        assert_eq!(hub.execute(PrinterCommand::CancelPrint).await, Err(PrinterError::ChannelClosed));
    }
}
