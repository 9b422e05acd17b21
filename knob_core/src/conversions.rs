//! `From` implementations bridging `knob_config` types to `knob_core` types.

use crate::config::{ButtonCfg, EncoderCfg, EscCfg, KnobCfg, RampCfg};

impl From<&knob_config::EscCfg> for EscCfg {
    fn from(c: &knob_config::EscCfg) -> Self {
        Self {
            neutral_us: c.neutral_us,
            min_us: c.min_us,
            max_us: c.max_us,
            step_us: c.step_us,
        }
    }
}

impl From<&knob_config::EncoderCfg> for EncoderCfg {
    fn from(c: &knob_config::EncoderCfg) -> Self {
        Self {
            max_steps: c.max_steps,
            debounce_polls: c.debounce_polls,
        }
    }
}

impl From<&knob_config::ButtonCfg> for ButtonCfg {
    fn from(c: &knob_config::ButtonCfg) -> Self {
        Self { hold_ms: c.hold_ms }
    }
}

impl From<&knob_config::RampCfg> for RampCfg {
    fn from(c: &knob_config::RampCfg) -> Self {
        Self {
            dwell_ms: c.dwell_ms,
        }
    }
}

// ── Whole config ─────────────────────────────────────────────────────────────

impl From<&knob_config::Config> for KnobCfg {
    fn from(c: &knob_config::Config) -> Self {
        Self {
            esc: (&c.esc).into(),
            encoder: (&c.encoder).into(),
            button: (&c.button).into(),
            ramp: (&c.ramp).into(),
        }
    }
}
