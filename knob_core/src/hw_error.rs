//! Maps `Box<dyn Error>` from trait boundaries to typed `KnobError`.
//!
//! The pin and ESC traits in `knob_traits` return `Box<dyn Error + Send + Sync>`;
//! this module turns those into `KnobError`, with a feature-gated path that
//! downcasts `knob_hardware::HwError` precisely.

use crate::error::KnobError;

/// Map a trait-boundary error to a typed `KnobError`.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> KnobError {
    #[cfg(feature = "hardware-errors")]
    {
        use knob_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Script(msg) => KnobError::State(format!("simulation script: {msg}")),
                other => KnobError::HardwareFault(other.to_string()),
            };
        }
    }

    KnobError::Hardware(e.to_string())
}
