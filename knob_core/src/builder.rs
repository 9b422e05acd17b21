//! Type-state builder for `Knob` and generic `build_knob` constructor.
//!
//! The builder enforces at compile time that the encoder pins, the button pin
//! and the ESC are provided before `build()` is available. `try_build()` is
//! always available for dynamic checks.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use knob_traits::clock::{Clock, MonotonicClock};
use knob_traits::{Esc, InputPin};

use crate::button::DebouncedButton;
use crate::config::*;
use crate::core::KnobCore;
use crate::decoder::QuadratureDecoder;
use crate::error::{BuildError, Result};
use crate::runner::{self, RunParams, RunSummary};
use crate::speed::SpeedController;
use crate::status::TickStatus;
use crate::telemetry::{Telemetry, TracingTelemetry};

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Boxed knob controller; the usual entry point for the CLI and tests.
pub struct Knob {
    pub(crate) inner: KnobCore<Box<dyn InputPin>, Box<dyn Esc>>,
}

impl fmt::Debug for Knob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Knob")
            .field("counter", &self.inner.counter())
            .field("command", &self.inner.command())
            .field("armed", &self.inner.is_armed())
            .finish()
    }
}

impl Knob {
    /// Start building a Knob.
    pub fn builder() -> KnobBuilder<Missing, Missing, Missing> {
        KnobBuilder::default()
    }

    pub fn counter(&self) -> i16 {
        self.inner.counter()
    }

    pub fn command(&self) -> u16 {
        self.inner.command()
    }

    pub fn is_neutral(&self) -> bool {
        self.inner.is_neutral()
    }

    pub fn last_hold(&self) -> Option<Duration> {
        self.inner.last_hold()
    }

    /// Write neutral and arm the loop.
    pub fn begin(&mut self) -> Result<()> {
        self.inner.begin()
    }

    /// One iteration of the control loop.
    pub fn tick(&mut self) -> Result<TickStatus> {
        self.inner.tick()
    }

    /// Run the ramp now (counter must be at neutral).
    pub fn ramp(&mut self) -> Result<Option<usize>> {
        self.inner.ramp()
    }

    /// Write neutral and disarm.
    pub fn shutdown(&mut self) -> Result<()> {
        self.inner.shutdown()
    }

    /// Drive the paced loop until `should_stop` returns true or the run cap hits.
    pub fn run(
        &mut self,
        params: &RunParams,
        should_stop: impl FnMut() -> bool,
    ) -> Result<RunSummary> {
        runner::run(&mut self.inner, params, should_stop)
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Knob`. All configuration is validated on `build()`.
pub struct KnobBuilder<Enc, Btn, Out> {
    clk: Option<Box<dyn InputPin>>,
    dt: Option<Box<dyn InputPin>>,
    sw: Option<Box<dyn InputPin>>,
    esc: Option<Box<dyn Esc>>,
    esc_cfg: Option<EscCfg>,
    encoder_cfg: Option<EncoderCfg>,
    button_cfg: Option<ButtonCfg>,
    ramp_cfg: Option<RampCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    telemetry: Option<Box<dyn Telemetry>>,
    _e: PhantomData<Enc>,
    _b: PhantomData<Btn>,
    _o: PhantomData<Out>,
}

impl Default for KnobBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            clk: None,
            dt: None,
            sw: None,
            esc: None,
            esc_cfg: None,
            encoder_cfg: None,
            button_cfg: None,
            ramp_cfg: None,
            clock: None,
            telemetry: None,
            _e: PhantomData,
            _b: PhantomData,
            _o: PhantomData,
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Validate configuration and construct a `KnobCore`.
///
/// Shared by `KnobBuilder::try_build()` and `build_knob()`.
fn validate_and_build<P: InputPin, E: Esc>(
    clk: P,
    dt: P,
    sw: P,
    esc: E,
    cfg: KnobCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    telemetry: Option<Box<dyn Telemetry>>,
) -> Result<KnobCore<P, E>> {
    let KnobCfg {
        esc: esc_cfg,
        encoder,
        button,
        ramp,
    } = cfg;

    if esc_cfg.min_us >= esc_cfg.max_us {
        return Err(invalid("esc min_us must be < max_us"));
    }
    if !(esc_cfg.min_us < esc_cfg.neutral_us && esc_cfg.neutral_us < esc_cfg.max_us) {
        return Err(invalid("esc neutral_us must lie strictly between min_us and max_us"));
    }
    if esc_cfg.step_us == 0 {
        return Err(invalid("esc step_us must be > 0"));
    }
    if (esc_cfg.max_us - esc_cfg.neutral_us) % esc_cfg.step_us != 0 {
        return Err(invalid("esc max_us must be a whole number of steps above neutral"));
    }
    if encoder.max_steps == 0 {
        return Err(invalid("encoder max_steps must be >= 1"));
    }
    let span = u32::from(encoder.max_steps) * u32::from(esc_cfg.step_us);
    if u32::from(esc_cfg.neutral_us) + span > u32::from(esc_cfg.max_us)
        || u32::from(esc_cfg.neutral_us) < u32::from(esc_cfg.min_us) + span
    {
        return Err(invalid("encoder max_steps * step_us leaves the esc range"));
    }
    if button.hold_ms == 0 {
        return Err(invalid("button hold_ms must be >= 1"));
    }

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let telemetry = telemetry.unwrap_or_else(|| Box::new(TracingTelemetry));

    Ok(KnobCore {
        clk,
        dt,
        sw,
        decoder: QuadratureDecoder::with_debounce(encoder.debounce_polls),
        button: DebouncedButton::new(Duration::from_millis(button.hold_ms)),
        speed: SpeedController::new(
            esc,
            esc_cfg,
            encoder.max_steps,
            ramp,
            clock.clone(),
            telemetry,
        ),
        clock,
        armed: false,
    })
}

impl<Enc, Btn, Out> KnobBuilder<Enc, Btn, Out> {
    /// Fallible build available in any type-state; reports which piece is missing.
    pub fn try_build(self) -> Result<Knob> {
        let (clk, dt) = match (self.clk, self.dt) {
            (Some(clk), Some(dt)) => (clk, dt),
            _ => return Err(eyre::Report::new(BuildError::MissingEncoder)),
        };
        let sw = self
            .sw
            .ok_or_else(|| eyre::Report::new(BuildError::MissingButton))?;
        let esc = self
            .esc
            .ok_or_else(|| eyre::Report::new(BuildError::MissingEsc))?;

        let cfg = KnobCfg {
            esc: self.esc_cfg.unwrap_or_default(),
            encoder: self.encoder_cfg.unwrap_or_default(),
            button: self.button_cfg.unwrap_or_default(),
            ramp: self.ramp_cfg.unwrap_or_default(),
        };
        let inner = validate_and_build(clk, dt, sw, esc, cfg, self.clock, self.telemetry)?;
        Ok(Knob { inner })
    }
}

/// Chainable setters that do not affect type-state.
impl<Enc, Btn, Out> KnobBuilder<Enc, Btn, Out> {
    pub fn with_esc_cfg(mut self, cfg: EscCfg) -> Self {
        self.esc_cfg = Some(cfg);
        self
    }
    pub fn with_encoder_cfg(mut self, cfg: EncoderCfg) -> Self {
        self.encoder_cfg = Some(cfg);
        self
    }
    pub fn with_button_cfg(mut self, cfg: ButtonCfg) -> Self {
        self.button_cfg = Some(cfg);
        self
    }
    pub fn with_ramp_cfg(mut self, cfg: RampCfg) -> Self {
        self.ramp_cfg = Some(cfg);
        self
    }
    /// Set all four sections at once.
    pub fn with_cfg(self, cfg: KnobCfg) -> Self {
        self.with_esc_cfg(cfg.esc)
            .with_encoder_cfg(cfg.encoder)
            .with_button_cfg(cfg.button)
            .with_ramp_cfg(cfg.ramp)
    }
    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    /// Provide a telemetry sink; defaults to `TracingTelemetry`.
    pub fn with_telemetry(mut self, telemetry: Box<dyn Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }
}

// Setters that advance type-state
impl<Btn, Out> KnobBuilder<Missing, Btn, Out> {
    pub fn with_encoder(
        self,
        clk: impl InputPin + 'static,
        dt: impl InputPin + 'static,
    ) -> KnobBuilder<Set, Btn, Out> {
        KnobBuilder {
            clk: Some(Box::new(clk)),
            dt: Some(Box::new(dt)),
            sw: self.sw,
            esc: self.esc,
            esc_cfg: self.esc_cfg,
            encoder_cfg: self.encoder_cfg,
            button_cfg: self.button_cfg,
            ramp_cfg: self.ramp_cfg,
            clock: self.clock,
            telemetry: self.telemetry,
            _e: PhantomData,
            _b: PhantomData,
            _o: PhantomData,
        }
    }
}

impl<Enc, Out> KnobBuilder<Enc, Missing, Out> {
    pub fn with_button(self, sw: impl InputPin + 'static) -> KnobBuilder<Enc, Set, Out> {
        KnobBuilder {
            clk: self.clk,
            dt: self.dt,
            sw: Some(Box::new(sw)),
            esc: self.esc,
            esc_cfg: self.esc_cfg,
            encoder_cfg: self.encoder_cfg,
            button_cfg: self.button_cfg,
            ramp_cfg: self.ramp_cfg,
            clock: self.clock,
            telemetry: self.telemetry,
            _e: PhantomData,
            _b: PhantomData,
            _o: PhantomData,
        }
    }
}

impl<Enc, Btn> KnobBuilder<Enc, Btn, Missing> {
    pub fn with_esc(self, esc: impl Esc + 'static) -> KnobBuilder<Enc, Btn, Set> {
        KnobBuilder {
            clk: self.clk,
            dt: self.dt,
            sw: self.sw,
            esc: Some(Box::new(esc)),
            esc_cfg: self.esc_cfg,
            encoder_cfg: self.encoder_cfg,
            button_cfg: self.button_cfg,
            ramp_cfg: self.ramp_cfg,
            clock: self.clock,
            telemetry: self.telemetry,
            _e: PhantomData,
            _b: PhantomData,
            _o: PhantomData,
        }
    }
}

impl KnobBuilder<Set, Set, Set> {
    /// Validate and build. Only available once encoder, button and ESC are set.
    pub fn build(self) -> Result<Knob> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias using the same core.
pub type KnobG<P, E> = KnobCore<P, E>;

/// Build a statically-dispatched `KnobG` from concrete pins and ESC.
pub fn build_knob<P, E>(
    clk: P,
    dt: P,
    sw: P,
    esc: E,
    cfg: KnobCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    telemetry: Option<Box<dyn Telemetry>>,
) -> Result<KnobG<P, E>>
where
    P: InputPin + 'static,
    E: Esc + 'static,
{
    validate_and_build(clk, dt, sw, esc, cfg, clock, telemetry)
}
