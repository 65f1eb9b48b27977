//! Paced tick runner: drives the controller at the configured tick
//! rate with drift-free absolute scheduling, and publishes state
//! transitions and faults through `tracing`.
//!
//! The runner owns nothing the controller needs for correctness — the
//! step function is deterministic on its own. This layer only supplies
//! the wall-clock pacing and observability a host process wants.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use probe_common::config::ControllerConfig;
use probe_common::status::FiringState;
use tracing::{debug, error, info};

use crate::controller::{FiringController, TickInputs, TickOutputs};

// ─── Tick Statistics ────────────────────────────────────────────────

/// O(1) per-tick timing statistics.
///
/// Updated every tick with no allocation.
#[derive(Debug, Clone)]
pub struct TickStats {
    /// Total ticks executed.
    pub tick_count: u64,
    /// Last tick duration [ns].
    pub last_tick_ns: u64,
    /// Minimum tick duration [ns].
    pub min_tick_ns: u64,
    /// Maximum tick duration [ns].
    pub max_tick_ns: u64,
    /// Running sum for average computation.
    pub sum_tick_ns: u64,
    /// Ticks that ran past the tick period.
    pub overruns: u64,
}

impl TickStats {
    pub const fn new() -> Self {
        Self {
            tick_count: 0,
            last_tick_ns: 0,
            min_tick_ns: u64::MAX,
            max_tick_ns: 0,
            sum_tick_ns: 0,
            overruns: 0,
        }
    }

    /// Record a tick duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: u64) {
        self.tick_count += 1;
        self.last_tick_ns = duration_ns;
        if duration_ns < self.min_tick_ns {
            self.min_tick_ns = duration_ns;
        }
        if duration_ns > self.max_tick_ns {
            self.max_tick_ns = duration_ns;
        }
        self.sum_tick_ns += duration_ns;
    }

    /// Average tick time [ns] (0 if no ticks yet).
    #[inline]
    pub fn avg_tick_ns(&self) -> u64 {
        if self.tick_count == 0 {
            0
        } else {
            self.sum_tick_ns / self.tick_count
        }
    }
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tick Runner ────────────────────────────────────────────────────

/// Why the runner stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// External shutdown flag cleared.
    Shutdown,
    /// Requested tick budget exhausted.
    TickBudget,
    /// Controller entered `HardFault` and halt-on-fault is set.
    Faulted,
}

/// Drives a [`FiringController`] at the configured tick rate.
pub struct TickRunner {
    controller: FiringController,
    tick_period: Duration,
    status_log_interval: u64,
    /// Stop the loop when the controller hard-faults.
    pub halt_on_fault: bool,
    /// Timing statistics.
    pub stats: TickStats,
}

impl TickRunner {
    pub fn new(controller: FiringController, config: &ControllerConfig) -> Self {
        // Config validation rejects zeros, but a struct-literal config
        // can bypass it; both values divide, so floor them at 1.
        Self {
            controller,
            tick_period: Duration::from_nanos(
                1_000_000_000 / config.tick_rate_hz.max(1) as u64,
            ),
            status_log_interval: config.status_log_interval.max(1) as u64,
            halt_on_fault: false,
            stats: TickStats::new(),
        }
    }

    /// Borrow the controller (diagnostics, tests).
    pub fn controller(&self) -> &FiringController {
        &self.controller
    }

    /// Run the paced loop.
    ///
    /// `inputs_for` is called once per tick with the tick number and
    /// must return that tick's input registers — the host register
    /// layer in disguise. Runs until the shutdown flag clears, the
    /// optional tick budget is exhausted, or (with `halt_on_fault`)
    /// the controller faults.
    pub fn run(
        &mut self,
        mut inputs_for: impl FnMut(u64) -> TickInputs,
        running: &Arc<AtomicBool>,
        max_ticks: Option<u64>,
    ) -> StopReason {
        let mut next_wake = Instant::now();
        let mut prev_state = self.controller.state();

        loop {
            if !running.load(Ordering::SeqCst) {
                info!("shutdown requested, leaving tick loop");
                return StopReason::Shutdown;
            }
            if let Some(budget) = max_ticks {
                if self.stats.tick_count >= budget {
                    return StopReason::TickBudget;
                }
            }

            next_wake += self.tick_period;
            let tick_start = Instant::now();

            let tick = self.stats.tick_count;
            let inputs = inputs_for(tick);
            let outputs = self.controller.step(&inputs);

            self.observe(tick, prev_state, &outputs);
            prev_state = self.controller.state();

            let duration = tick_start.elapsed();
            self.stats.record(duration.as_nanos() as u64);
            if duration > self.tick_period {
                self.stats.overruns += 1;
            }

            if self.halt_on_fault && prev_state == FiringState::HardFault {
                error!(code = ?self.controller.fault_code(), "halting on hard fault");
                return StopReason::Faulted;
            }

            // Absolute-time pacing; a late tick skips the sleep.
            let now = Instant::now();
            if next_wake > now {
                std::thread::sleep(next_wake - now);
            }
        }
    }

    /// Log transitions, faults, and the periodic status line.
    fn observe(&self, tick: u64, prev_state: FiringState, outputs: &TickOutputs) {
        let state = self.controller.state();
        if state != prev_state {
            debug!(?prev_state, ?state, tick, "state transition");
        }
        if tick % self.status_log_interval == 0 {
            info!(
                tick,
                ?state,
                status = format_args!("0x{:08x}", outputs.status_word),
                alarms = format_args!("0x{:02x}", outputs.alarms.bits()),
                "status"
            );
        }
    }
}
