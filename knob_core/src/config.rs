//! Runtime configuration for the knob controller.
//!
//! These are the structs `KnobCore` runs with. They are separate from the
//! TOML-deserialized config in `knob_config`; see `conversions` for the bridge.

/// ESC pulse-width range and the pulse change per encoder detent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscCfg {
    /// Zero-speed pulse (µs). Written on arm and on shutdown.
    pub neutral_us: u16,
    pub min_us: u16,
    pub max_us: u16,
    /// Pulse change per detent (µs).
    pub step_us: u16,
}

impl Default for EscCfg {
    fn default() -> Self {
        Self {
            neutral_us: 1500,
            min_us: 1000,
            max_us: 2000,
            step_us: 50,
        }
    }
}

impl EscCfg {
    /// Pulse width for a counter value: `neutral + counter * step`.
    ///
    /// Saturates at the u16 bounds; a validated config keeps the result inside
    /// `[min_us, max_us]` for every counter within `±max_steps`.
    pub fn command_for(&self, counter: i16) -> u16 {
        let us = i32::from(self.neutral_us) + i32::from(counter) * i32::from(self.step_us);
        u16::try_from(us.max(0)).unwrap_or(u16::MAX)
    }
}

/// Quadrature decoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderCfg {
    /// Counter saturates at `±max_steps`.
    pub max_steps: u16,
    /// Polls a new clock level must persist before it is accepted (0 or 1 = off).
    pub debounce_polls: u8,
}

impl Default for EncoderCfg {
    fn default() -> Self {
        Self {
            max_steps: 10,
            debounce_polls: 0,
        }
    }
}

/// Push-button settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonCfg {
    /// A press must last strictly longer than this to activate.
    pub hold_ms: u64,
}

impl Default for ButtonCfg {
    fn default() -> Self {
        Self { hold_ms: 1000 }
    }
}

/// Demonstration ramp settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampCfg {
    /// Time each ramp command is held before the next one (ms).
    pub dwell_ms: u64,
}

impl Default for RampCfg {
    fn default() -> Self {
        Self { dwell_ms: 500 }
    }
}

/// Everything `KnobCore` needs besides its I/O.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KnobCfg {
    pub esc: EscCfg,
    pub encoder: EncoderCfg,
    pub button: ButtonCfg,
    pub ramp: RampCfg,
}
