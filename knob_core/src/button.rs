//! Active-low push button with a hold-time gate.
//!
//! Pressing pulls the line low. A press counts only when it is released after
//! being held strictly longer than the threshold; shorter taps and bounce are
//! dropped at release time.

use std::time::{Duration, Instant};

use crate::util::as_ms;

/// Edge-tracking state owned by one `DebouncedButton`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub previous_level: bool,
    pub pressed_at: Option<Instant>,
}

impl Default for ButtonState {
    /// Released (pulled high), no press in flight.
    fn default() -> Self {
        Self {
            previous_level: true,
            pressed_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DebouncedButton {
    state: ButtonState,
    threshold: Duration,
    last_hold: Option<Duration>,
}

impl DebouncedButton {
    pub fn new(threshold: Duration) -> Self {
        Self {
            state: ButtonState::default(),
            threshold,
            last_hold: None,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Forget any press in flight and assume the button is released.
    pub fn reset(&mut self) {
        self.state = ButtonState::default();
        self.last_hold = None;
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// True while a press has been seen and not yet released.
    pub fn is_pressed(&self) -> bool {
        self.state.pressed_at.is_some()
    }

    /// Duration of the most recent completed press, qualifying or not.
    pub fn last_hold(&self) -> Option<Duration> {
        self.last_hold
    }

    /// Feed one raw line sample. Returns true exactly once per press that is
    /// released after more than `threshold`.
    pub fn poll(&mut self, raw_level: bool, now: Instant) -> bool {
        let previous = self.state.previous_level;
        self.state.previous_level = raw_level;
        match (previous, raw_level) {
            (true, false) => {
                self.state.pressed_at = Some(now);
                false
            }
            (false, true) => {
                // Release without a recorded press (line was low at reset).
                let Some(at) = self.state.pressed_at.take() else {
                    return false;
                };
                let held = now.saturating_duration_since(at);
                self.last_hold = Some(held);
                tracing::debug!(held_ms = as_ms(held), "button released");
                held > self.threshold
            }
            _ => false,
        }
    }
}
