//! Paced driver around `KnobCore::tick`.

use std::time::Duration;

use eyre::WrapErr;
use knob_traits::{Esc, InputPin};

use crate::core::KnobCore;
use crate::error::Result;
use crate::status::TickStatus;
use crate::util::{as_ms, as_us, period_us};

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub poll_hz: u32,
    /// Stop cleanly after this long. `None` runs until asked to stop.
    pub max_run_ms: Option<u64>,
    /// Collect per-tick timing.
    pub collect_stats: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            poll_hz: 1000,
            max_run_ms: None,
            collect_stats: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop predicate returned true.
    Requested,
    MaxRuntime,
}

impl StopReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::MaxRuntime => "max_runtime",
        }
    }
}

/// Tick timing. Ramp ticks count as overruns since they block for the whole ramp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub min_tick_us: u64,
    pub max_tick_us: u64,
    pub mean_tick_us: u64,
    /// Ticks that took longer than one poll period.
    pub overruns: u64,
}

#[derive(Debug, Default)]
struct StatsAcc {
    n: u64,
    total_us: u64,
    min_us: u64,
    max_us: u64,
    overruns: u64,
}

impl StatsAcc {
    fn record(&mut self, spent: Duration, period: Duration) {
        let us = as_us(spent);
        self.min_us = if self.n == 0 { us } else { self.min_us.min(us) };
        self.max_us = self.max_us.max(us);
        self.total_us = self.total_us.saturating_add(us);
        self.n += 1;
        if spent > period {
            self.overruns += 1;
        }
    }

    fn finish(&self) -> LoopStats {
        LoopStats {
            min_tick_us: self.min_us,
            max_tick_us: self.max_us,
            mean_tick_us: self.total_us.checked_div(self.n).unwrap_or(0),
            overruns: self.overruns,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ticks: u64,
    /// Ticks that rewrote the ESC from a detent.
    pub adjustments: u64,
    pub ramps: u64,
    pub final_counter: i16,
    pub final_command: u16,
    pub elapsed_ms: u64,
    pub stop_reason: StopReason,
    pub stats: Option<LoopStats>,
}

/// Arm (if needed), tick at `poll_hz` until `should_stop` returns true or the
/// run cap is reached, then write neutral.
///
/// On a tick error neutral is written best effort and the error returned.
/// Deadlines that fall behind (a ramp blocks for seconds) are re-anchored to
/// the current time instead of being caught up in a burst.
pub fn run<P, E>(
    knob: &mut KnobCore<P, E>,
    params: &RunParams,
    mut should_stop: impl FnMut() -> bool,
) -> Result<RunSummary>
where
    P: InputPin,
    E: Esc,
{
    if !knob.is_armed() {
        knob.begin()?;
    }
    let clock = knob.clock().clone();
    let period = Duration::from_micros(period_us(params.poll_hz));
    let start = clock.now();
    let mut next = start;
    let mut acc = StatsAcc::default();
    let (mut ticks, mut adjustments, mut ramps) = (0u64, 0u64, 0u64);

    tracing::info!(
        poll_hz = params.poll_hz,
        max_run_ms = ?params.max_run_ms,
        "control loop start"
    );

    let stop_reason = loop {
        if should_stop() {
            break StopReason::Requested;
        }
        if let Some(max) = params.max_run_ms
            && clock.ms_since(start) >= max
        {
            break StopReason::MaxRuntime;
        }

        let t0 = clock.now();
        let status = match knob.tick() {
            Ok(s) => s,
            Err(e) => {
                if let Err(stop) = knob.shutdown() {
                    tracing::warn!(error = %stop, "shutdown failed after tick error");
                }
                return Err(e.wrap_err("control loop"));
            }
        };
        ticks += 1;
        match status {
            TickStatus::Idle => {}
            TickStatus::Adjusted { .. } => adjustments += 1,
            TickStatus::Ramped { .. } => ramps += 1,
        }

        let now = clock.now();
        if params.collect_stats {
            acc.record(now.saturating_duration_since(t0), period);
        }
        next += period;
        if now > next {
            next = now;
        } else {
            clock.sleep_until(next);
        }
    };

    knob.shutdown()?;
    let elapsed_ms = as_ms(clock.now().saturating_duration_since(start));
    tracing::info!(
        ticks,
        adjustments,
        ramps,
        elapsed_ms,
        reason = stop_reason.as_str(),
        "control loop stopped"
    );

    Ok(RunSummary {
        ticks,
        adjustments,
        ramps,
        final_counter: knob.counter(),
        final_command: knob.command(),
        elapsed_ms,
        stop_reason,
        stats: params.collect_stats.then(|| acc.finish()),
    })
}
