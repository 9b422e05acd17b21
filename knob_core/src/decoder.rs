//! Quadrature decoder for the rotary encoder's clock/data pair.
//!
//! A detent is counted on the clock line's low-to-high edge only. At that edge
//! the data line tells the direction: equal to the clock means clockwise,
//! different means counter-clockwise.

use std::fmt;

/// Result of one decoder poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    Ccw,
    #[default]
    None,
    Cw,
}

impl Rotation {
    /// Signed counter change: -1, 0 or +1.
    pub const fn delta(self) -> i8 {
        match self {
            Self::Ccw => -1,
            Self::None => 0,
            Self::Cw => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ccw => "CCW",
            Self::None => "-",
            Self::Cw => "CW",
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Clock level seen on the previous poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderState {
    pub previous_clock_level: bool,
}

/// Edge detector over the clock/data pair, with an optional settle filter on
/// the clock line.
#[derive(Debug, Clone)]
pub struct QuadratureDecoder {
    state: EncoderState,
    debounce_polls: u8,
    candidate: bool,
    candidate_polls: u8,
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadratureDecoder {
    /// Decoder that trusts every clock transition.
    pub const fn new() -> Self {
        Self {
            state: EncoderState {
                previous_clock_level: false,
            },
            debounce_polls: 0,
            candidate: false,
            candidate_polls: 0,
        }
    }

    /// Decoder that only accepts a clock level after it has been read on
    /// `polls` consecutive polls. `0` and `1` disable filtering.
    pub const fn with_debounce(polls: u8) -> Self {
        let mut d = Self::new();
        d.debounce_polls = polls;
        d
    }

    /// Seed the previous clock level, typically from a read taken while arming,
    /// so a line that idles high does not count a phantom detent.
    pub fn seed(&mut self, clock_level: bool) {
        self.state.previous_clock_level = clock_level;
        self.candidate = clock_level;
        self.candidate_polls = self.debounce_polls;
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Feed one sample of both lines and report the rotation it completes.
    pub fn poll(&mut self, clock_level: bool, data_level: bool) -> Rotation {
        let clock = self.filtered(clock_level);
        let rising = clock && !self.state.previous_clock_level;
        self.state.previous_clock_level = clock;
        if !rising {
            return Rotation::None;
        }
        if data_level == clock {
            Rotation::Cw
        } else {
            Rotation::Ccw
        }
    }

    fn filtered(&mut self, raw: bool) -> bool {
        if self.debounce_polls <= 1 {
            return raw;
        }
        if raw == self.candidate {
            self.candidate_polls = self.candidate_polls.saturating_add(1);
        } else {
            self.candidate = raw;
            self.candidate_polls = 1;
        }
        if self.candidate_polls >= self.debounce_polls {
            self.candidate
        } else {
            self.state.previous_clock_level
        }
    }
}
