//! Outcome of one control loop tick.

use crate::decoder::Rotation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Nothing changed.
    Idle,
    /// A detent moved the counter (or hit the clamp) and the ESC was rewritten.
    Adjusted {
        rotation: Rotation,
        counter: i16,
        command: u16,
    },
    /// A qualifying button release ran the full ramp.
    Ramped { steps: usize },
}
