//! Speed counter, ESC command and the demonstration ramp.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use knob_traits::Clock;

use crate::config::{EscCfg, RampCfg};
use crate::decoder::Rotation;
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::telemetry::{Telemetry, TelemetryEvent};
use crate::util::as_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampPhase {
    Accelerating,
    Decelerating,
}

impl RampPhase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Accelerating => "Accelerating",
            Self::Decelerating => "De-accelerating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampStep {
    pub phase: RampPhase,
    pub command: u16,
}

/// Commands from `neutral + step` up to `max`, then from `max - step` back down
/// to `neutral`, both ends inclusive.
#[derive(Debug, Clone)]
pub struct RampSequence {
    neutral: u16,
    max: u16,
    step: u16,
    next: Option<RampStep>,
}

impl RampSequence {
    pub fn new(esc: &EscCfg) -> Self {
        let first = if esc.step_us == 0 {
            None
        } else {
            esc.neutral_us
                .checked_add(esc.step_us)
                .filter(|c| *c <= esc.max_us)
                .map(|command| RampStep {
                    phase: RampPhase::Accelerating,
                    command,
                })
        };
        Self {
            neutral: esc.neutral_us,
            max: esc.max_us,
            step: esc.step_us,
            next: first,
        }
    }

    fn descend_from(&self, command: u16) -> Option<RampStep> {
        command
            .checked_sub(self.step)
            .filter(|c| *c >= self.neutral)
            .map(|command| RampStep {
                phase: RampPhase::Decelerating,
                command,
            })
    }
}

impl Iterator for RampSequence {
    type Item = RampStep;

    fn next(&mut self) -> Option<RampStep> {
        let current = self.next?;
        self.next = match current.phase {
            RampPhase::Accelerating => match current.command.checked_add(self.step) {
                Some(c) if c <= self.max => Some(RampStep {
                    phase: RampPhase::Accelerating,
                    command: c,
                }),
                _ => self.descend_from(self.max),
            },
            RampPhase::Decelerating => self.descend_from(current.command),
        };
        Some(current)
    }
}

/// Signed detent count, saturating at `±limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedCounter {
    value: i16,
    limit: i16,
}

impl SpeedCounter {
    pub fn new(max_steps: u16) -> Self {
        Self {
            value: 0,
            limit: i16::try_from(max_steps).unwrap_or(i16::MAX),
        }
    }

    pub fn value(&self) -> i16 {
        self.value
    }

    pub fn limit(&self) -> i16 {
        self.limit
    }

    pub fn is_neutral(&self) -> bool {
        self.value == 0
    }

    pub fn apply(&mut self, delta: i8) {
        self.value = self
            .value
            .saturating_add(i16::from(delta))
            .clamp(-self.limit, self.limit);
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}

/// Owns the ESC and the counter → command mapping.
pub struct SpeedController<E: knob_traits::Esc> {
    esc: E,
    cfg: EscCfg,
    counter: SpeedCounter,
    command: u16,
    dwell: Duration,
    clock: Arc<dyn Clock + Send + Sync>,
    telemetry: Box<dyn Telemetry>,
}

impl<E: knob_traits::Esc> core::fmt::Debug for SpeedController<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpeedController")
            .field("counter", &self.counter.value())
            .field("command", &self.command)
            .finish()
    }
}

impl<E: knob_traits::Esc> SpeedController<E> {
    pub fn new(
        esc: E,
        cfg: EscCfg,
        max_steps: u16,
        ramp: RampCfg,
        clock: Arc<dyn Clock + Send + Sync>,
        telemetry: Box<dyn Telemetry>,
    ) -> Self {
        Self {
            esc,
            cfg,
            counter: SpeedCounter::new(max_steps),
            command: cfg.neutral_us,
            dwell: Duration::from_millis(ramp.dwell_ms),
            clock,
            telemetry,
        }
    }

    pub fn counter(&self) -> i16 {
        self.counter.value()
    }

    /// Last command written to the ESC.
    pub fn command(&self) -> u16 {
        self.command
    }

    pub fn is_neutral(&self) -> bool {
        self.counter.is_neutral()
    }

    pub fn esc_cfg(&self) -> &EscCfg {
        &self.cfg
    }

    pub(crate) fn emit(&mut self, event: &TelemetryEvent) {
        self.telemetry.emit(event);
    }

    fn write(&mut self, pulse_us: u16) -> Result<()> {
        self.esc
            .set_pulse_us(pulse_us)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("esc write")?;
        self.command = pulse_us;
        Ok(())
    }

    /// Zero the counter and write neutral.
    pub fn arm(&mut self) -> Result<()> {
        self.counter.reset();
        self.write(self.cfg.neutral_us)?;
        self.emit(&TelemetryEvent::Armed {
            command: self.command,
        });
        Ok(())
    }

    /// Apply one decoder result. Any non-zero rotation rewrites the command,
    /// even when the counter is already saturated. Returns whether a write
    /// happened.
    pub fn on_rotation(&mut self, rotation: Rotation) -> Result<bool> {
        if rotation == Rotation::None {
            return Ok(false);
        }
        self.counter.apply(rotation.delta());
        let command = self.cfg.command_for(self.counter.value());
        self.write(command)?;
        self.emit(&TelemetryEvent::Rotated {
            direction: rotation,
            counter: self.counter.value(),
            command,
        });
        Ok(true)
    }

    /// Run the full ramp, blocking for `steps * dwell`. Does nothing and
    /// returns `None` unless the counter is at neutral.
    ///
    /// If the ESC rejects a step, neutral is written (best effort) before the
    /// error is returned.
    pub fn on_button_activation(&mut self) -> Result<Option<usize>> {
        if !self.counter.is_neutral() {
            tracing::debug!(counter = self.counter.value(), "ramp skipped: not at neutral");
            return Ok(None);
        }
        tracing::info!(
            from = self.cfg.neutral_us,
            to = self.cfg.max_us,
            dwell_ms = as_ms(self.dwell),
            "ramp start"
        );

        let mut steps = 0usize;
        let mut phase = None;
        for step in RampSequence::new(&self.cfg) {
            if phase != Some(step.phase) {
                phase = Some(step.phase);
                self.emit(&TelemetryEvent::RampPhase { phase: step.phase });
            }
            if let Err(e) = self.write(step.command) {
                if let Err(stop) = self.write(self.cfg.neutral_us) {
                    tracing::warn!(error = %stop, "neutral write failed after ramp error");
                }
                return Err(e.wrap_err("ramp step"));
            }
            self.emit(&TelemetryEvent::RampStep {
                phase: step.phase,
                command: step.command,
            });
            steps += 1;
            let deadline = self.clock.now() + self.dwell;
            self.clock.sleep_until(deadline);
        }

        self.emit(&TelemetryEvent::RampCompleted { steps });
        tracing::info!(steps, "ramp done");
        Ok(Some(steps))
    }

    /// Write neutral. The counter is left as is.
    pub fn shutdown(&mut self) -> Result<()> {
        self.write(self.cfg.neutral_us)?;
        self.emit(&TelemetryEvent::Stopped {
            command: self.command,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ramp_goes_up_then_back_to_neutral() {
        let seq: Vec<u16> = RampSequence::new(&EscCfg::default())
            .map(|s| s.command)
            .collect();
        let mut expected: Vec<u16> = (1..=10).map(|i| 1500 + i * 50).collect();
        expected.extend((0..10).rev().map(|i| 1500 + i * 50));
        assert_eq!(seq, expected);
        assert_eq!(seq.first(), Some(&1550));
        assert_eq!(seq.last(), Some(&1500));
    }

    #[test]
    fn ramp_phases_switch_after_max() {
        let steps: Vec<RampStep> = RampSequence::new(&EscCfg::default()).collect();
        assert_eq!(steps[9].command, 2000);
        assert_eq!(steps[9].phase, RampPhase::Accelerating);
        assert_eq!(steps[10].command, 1950);
        assert_eq!(steps[10].phase, RampPhase::Decelerating);
    }

    #[test]
    fn ramp_with_zero_step_is_empty() {
        let esc = EscCfg {
            step_us: 0,
            ..EscCfg::default()
        };
        assert_eq!(RampSequence::new(&esc).count(), 0);
    }

    #[test]
    fn counter_saturates() {
        let mut c = SpeedCounter::new(2);
        for _ in 0..5 {
            c.apply(1);
        }
        assert_eq!(c.value(), 2);
        for _ in 0..9 {
            c.apply(-1);
        }
        assert_eq!(c.value(), -2);
    }
}
