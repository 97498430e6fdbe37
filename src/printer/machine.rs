//! The printer state machine.
//!
//! ```text
//!   Idle --startPrint--> Printing (heating phase -> printing phase) --done--> Idle
//!   Printing --cancelPrint--> Idle
//!   any --startHoming--> Homing --delay--> Idle
//! ```
//!
//! Heating and printing are both reported as `Printing`; which phase is live
//! is tracked by which timer the [`SimulationClock`] is running.

use std::sync::Arc;

use crate::config::SimulationConfig;

use super::clock::{ClockTick, SimulationClock, TimerKind};
use super::state::{PrinterState, PrinterStatus};
use super::{PrinterCommand, PrinterError, SnapshotSink};

pub struct PrinterStateMachine {
    state: PrinterState,
    clock: SimulationClock,
    config: SimulationConfig,
    sink: Arc<dyn SnapshotSink>,
    current_job: Option<String>,
}

impl PrinterStateMachine {
    pub fn new(config: SimulationConfig, clock: SimulationClock, sink: Arc<dyn SnapshotSink>) -> Self {
        Self {
            state: PrinterState::new(config.ambient_temp),
            clock,
            config,
            sink,
            current_job: None,
        }
    }

    pub fn state(&self) -> &PrinterState {
        &self.state
    }

    pub fn snapshot(&self) -> PrinterState {
        self.state.clone()
    }

    /// Name of the job currently printing, if any.
    pub fn current_job(&self) -> Option<&str> {
        self.current_job.as_deref()
    }

    pub fn execute(&mut self, command: PrinterCommand) -> Result<(), PrinterError> {
        match command {
            PrinterCommand::StartPrint { name } => self.start_print(&name),
            PrinterCommand::CancelPrint => {
                self.cancel_print();
                Ok(())
            }
            PrinterCommand::StartHoming => {
                self.start_homing();
                Ok(())
            }
        }
    }

    /// Starts a print job. Only allowed from `Idle`; the state is left
    /// untouched otherwise.
    pub fn start_print(&mut self, name: &str) -> Result<(), PrinterError> {
        if self.state.status != PrinterStatus::Idle {
            tracing::warn!(status = %self.state.status, job = name, "Rejecting print job, printer busy");
            return Err(PrinterError::Busy);
        }
        self.state.status = PrinterStatus::Printing;
        self.state.print_progress = 0.0;
        self.current_job = Some(name.to_string());
        self.clock.cancel(TimerKind::Printing);
        self.clock.start_periodic(TimerKind::Heating, self.config.tick_interval());
        self.publish();
        tracing::info!(job = name, "Print job started");
        Ok(())
    }

    /// Cancels the running print. Returns false (and changes nothing) when
    /// the printer is not printing.
    pub fn cancel_print(&mut self) -> bool {
        if self.state.status != PrinterStatus::Printing {
            return false;
        }
        self.clock.cancel(TimerKind::Heating);
        self.clock.cancel(TimerKind::Printing);
        self.enter_idle();
        self.publish();
        tracing::info!("Print job cancelled");
        true
    }

    /// Homes the printer from any status. A print in progress is abandoned
    /// and a pending homing is superseded.
    pub fn start_homing(&mut self) {
        if self.state.status == PrinterStatus::Printing {
            tracing::warn!(progress = self.state.print_progress, "Homing requested mid-print, abandoning job");
        }
        self.clock.cancel(TimerKind::Heating);
        self.clock.cancel(TimerKind::Printing);
        self.current_job = None;
        self.state.status = PrinterStatus::Homing;
        self.clock.start_once(TimerKind::Homing, self.config.homing_delay());
        self.publish();
        tracing::info!("Homing started");
    }

    /// Applies a tick from the clock. Ticks from cancelled or replaced
    /// timers are ignored.
    pub fn handle_tick(&mut self, tick: ClockTick) {
        if !self.clock.is_current(&tick) {
            tracing::trace!(?tick, "Dropping stale tick");
            return;
        }
        match tick.kind {
            TimerKind::Heating => self.heating_tick(),
            TimerKind::Printing => self.printing_tick(),
            TimerKind::Homing => {
                self.clock.complete(&tick);
                self.finish_homing();
            }
        }
    }

    fn heating_tick(&mut self) {
        if self.state.status != PrinterStatus::Printing {
            self.clock.cancel(TimerKind::Heating);
            return;
        }
        let temp = &mut self.state.temperature;
        if temp.hotend < self.config.hotend_target {
            temp.hotend = (temp.hotend + self.config.hotend_step).min(self.config.hotend_target);
        }
        if temp.bed < self.config.bed_target {
            temp.bed = (temp.bed + self.config.bed_step).min(self.config.bed_target);
        }
        self.publish();

        if self.targets_reached() {
            let temp = self.state.temperature;
            tracing::debug!(hotend = temp.hotend, bed = temp.bed, "Heating complete");
            self.clock.cancel(TimerKind::Heating);
            self.clock.start_periodic(TimerKind::Printing, self.config.tick_interval());
        }
    }

    fn printing_tick(&mut self) {
        if self.state.status != PrinterStatus::Printing {
            self.clock.cancel(TimerKind::Printing);
            return;
        }
        let next = self.state.print_progress + self.config.progress_step;
        let finished = next > 100.0;
        self.state.print_progress = next.min(100.0);
        self.record_sample();
        self.publish();

        if finished {
            self.clock.cancel(TimerKind::Printing);
            let job = self.current_job.clone().unwrap_or_default();
            self.enter_idle();
            self.publish();
            tracing::info!(job = %job, "Print job completed");
        }
    }

    fn finish_homing(&mut self) {
        self.enter_idle();
        self.publish();
        tracing::info!("Homing completed");
    }

    fn enter_idle(&mut self) {
        self.state.status = PrinterStatus::Idle;
        self.state.print_progress = 0.0;
        self.current_job = None;
    }

    fn targets_reached(&self) -> bool {
        self.state.temperature.hotend >= self.config.hotend_target
            && self.state.temperature.bed >= self.config.bed_target
    }

    fn record_sample(&mut self) {
        let label = chrono::Local::now().format("%-H:%M").to_string();
        let temperature = self.state.temperature;
        self.state
            .temp_history
            .record(label, temperature.hotend, temperature.bed, self.config.aux_sensor_temp);
    }

    fn publish(&self) {
        self.sink.publish(&self.state);
    }
}
