//! The printer task: the single place where printer state is mutated.
//!
//! Requests from the web layer and ticks from the simulation clock are both
//! funnelled into one task, so commands, timer callbacks and the snapshots
//! they publish are totally ordered.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::SimulationConfig;
use crate::printer::{ClockTick, PrinterStateMachine, SimulationClock};
use crate::web::hub::{BroadcastHub, ObserverRegistry};
use crate::web::models::ServerEvent;
use crate::web::printer_channel::PrinterRequest;

const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Spawns the printer task and returns the hub through which observers and
/// HTTP handlers reach it. The task stops once every hub clone is dropped.
pub fn spawn_printer(config: SimulationConfig) -> (BroadcastHub, JoinHandle<()>) {
    let registry = ObserverRegistry::new();
    let (printer_tx, printer_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
    let (tick_tx, tick_rx) = mpsc::unbounded_channel();
    let machine = PrinterStateMachine::new(config, SimulationClock::new(tick_tx), Arc::new(registry.clone()));
    let handle = tokio::spawn(run_printer(machine, registry.clone(), printer_rx, tick_rx));
    (BroadcastHub::new(registry, printer_tx), handle)
}

async fn run_printer(
    mut machine: PrinterStateMachine,
    registry: ObserverRegistry,
    mut requests: mpsc::Receiver<PrinterRequest>,
    mut ticks: mpsc::UnboundedReceiver<ClockTick>,
) {
    tracing::debug!("Printer task started");
    loop {
        tokio::select! {
            request = requests.recv() => {
                match request {
                    Some(request) => handle_request(&mut machine, &registry, request),
                    None => {
                        tracing::info!("Printer task shutting down");
                        break;
                    }
                }
            }
            Some(tick) = ticks.recv() => {
                machine.handle_tick(tick);
            }
        }
    }
}

fn handle_request(machine: &mut PrinterStateMachine, registry: &ObserverRegistry, request: PrinterRequest) {
    match request {
        PrinterRequest::GetState { respond_to } => {
            let _ = respond_to.send(machine.snapshot());
        }
        PrinterRequest::Attach { observer, respond_to } => {
            let snapshot = ServerEvent::PrinterState(Arc::new(machine.snapshot()));
            observer.send(snapshot);
            registry.register(observer);
            let _ = respond_to.send(());
        }
        PrinterRequest::Command { command, respond_to } => {
            let _ = respond_to.send(machine.execute(command));
        }
    }
}
