#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core knob-to-ESC speed control (hardware-agnostic).
//!
//! All I/O goes through `knob_traits::InputPin`, `knob_traits::Esc` and
//! `knob_traits::Clock`, so the same loop drives real GPIO, the simulator and
//! unit-test mocks.
//!
//! ## Architecture
//!
//! - **Decoding**: clock-edge quadrature decoding (`decoder` module)
//! - **Button**: active-low press with a hold-time gate (`button` module)
//! - **Speed**: saturating counter, ESC command and the ramp (`speed` module)
//! - **Loop**: `KnobCore::tick` composes the three; `runner` paces it
//! - **Telemetry**: observational status events (`telemetry` module)
//!
//! Within a tick the encoder is always handled first, and the button is only
//! sampled while the counter is at neutral. The ramp blocks the tick that
//! triggered it until it has returned to neutral.

pub mod button;
pub mod config;
pub mod conversions;
pub mod core;
pub mod decoder;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod runner;
pub mod speed;
pub mod status;
pub mod telemetry;
pub mod util;

mod builder;

pub use builder::{Knob, KnobBuilder, KnobG, Missing, Set, build_knob};
pub use button::{ButtonState, DebouncedButton};
pub use config::{ButtonCfg, EncoderCfg, EscCfg, KnobCfg, RampCfg};
pub use crate::core::KnobCore;
pub use decoder::{EncoderState, QuadratureDecoder, Rotation};
pub use error::{BuildError, KnobError, Report, Result};
pub use runner::{LoopStats, RunParams, RunSummary, StopReason};
pub use speed::{RampPhase, RampSequence, RampStep, SpeedController, SpeedCounter};
pub use status::TickStatus;
pub use telemetry::{
    FileTelemetry, NullTelemetry, RecordingTelemetry, Telemetry, TelemetryEvent,
    TracingTelemetry,
};
