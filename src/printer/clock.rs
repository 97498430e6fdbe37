//! Named simulation timers.
//!
//! Each [`TimerKind`] has at most one live timer. A timer is a spawned task
//! that pushes [`ClockTick`]s into the printer task's channel; it never
//! touches printer state itself. Ticks carry the generation of the timer that
//! produced them so ticks still sitting in the channel after a cancel can be
//! recognised as stale and dropped.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Heating,
    Printing,
    Homing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub kind: TimerKind,
    pub generation: u64,
}

#[derive(Debug)]
struct ActiveTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
pub struct SimulationClock {
    tick_tx: mpsc::UnboundedSender<ClockTick>,
    timers: HashMap<TimerKind, ActiveTimer>,
    next_generation: u64,
}

impl SimulationClock {
    pub fn new(tick_tx: mpsc::UnboundedSender<ClockTick>) -> Self {
        Self {
            tick_tx,
            timers: HashMap::new(),
            next_generation: 1,
        }
    }

    /// Starts a ticker firing every `period`, first tick one period from now.
    /// Replaces any live timer of the same kind.
    pub fn start_periodic(&mut self, kind: TimerKind, period: Duration) -> u64 {
        self.cancel(kind);
        let generation = self.bump_generation();
        let tx = self.tick_tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(ClockTick { kind, generation }).is_err() {
                    tracing::debug!(?kind, "Tick receiver dropped, stopping timer");
                    break;
                }
            }
        });
        self.timers.insert(kind, ActiveTimer { generation, handle });
        generation
    }

    /// Starts a timer that fires once after `delay`.
    /// Replaces any live timer of the same kind.
    pub fn start_once(&mut self, kind: TimerKind, delay: Duration) -> u64 {
        self.cancel(kind);
        let generation = self.bump_generation();
        let tx = self.tick_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ClockTick { kind, generation });
        });
        self.timers.insert(kind, ActiveTimer { generation, handle });
        generation
    }

    /// Stops the timer of the given kind. Returns whether one was live.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.timers.remove(&kind) {
            Some(timer) => {
                timer.handle.abort();
                tracing::trace!(?kind, generation = timer.generation, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.handle.abort();
        }
    }

    pub fn is_active(&self, kind: TimerKind) -> bool {
        self.timers.contains_key(&kind)
    }

    /// True if the tick came from the currently live timer of its kind.
    pub fn is_current(&self, tick: &ClockTick) -> bool {
        self.timers
            .get(&tick.kind)
            .is_some_and(|timer| timer.generation == tick.generation)
    }

    /// Forgets a one-shot timer after its tick has been handled.
    pub fn complete(&mut self, tick: &ClockTick) {
        if self.is_current(tick) {
            self.timers.remove(&tick.kind);
        }
    }

    fn bump_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

impl Drop for SimulationClock {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
