//! The control loop (`KnobCore`).
//!
//! One tick reads the encoder, applies any rotation, and only when the counter
//! sits at neutral samples the push button. A qualifying release runs the
//! ramp inside the same tick, so nothing else is polled until it finishes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use knob_traits::clock::Clock;
use knob_traits::{Esc, InputPin};

use crate::button::DebouncedButton;
use crate::decoder::{QuadratureDecoder, Rotation};
use crate::error::{KnobError, Result};
use crate::hw_error::map_hw_error;
use crate::speed::SpeedController;
use crate::status::TickStatus;
use crate::telemetry::TelemetryEvent;

pub struct KnobCore<P: InputPin, E: Esc> {
    pub(crate) clk: P,
    pub(crate) dt: P,
    pub(crate) sw: P,
    pub(crate) decoder: QuadratureDecoder,
    pub(crate) button: DebouncedButton,
    pub(crate) speed: SpeedController<E>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) armed: bool,
}

impl<P: InputPin, E: Esc> fmt::Debug for KnobCore<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnobCore")
            .field("counter", &self.speed.counter())
            .field("command", &self.speed.command())
            .field("armed", &self.armed)
            .finish()
    }
}

fn read_pin<P: InputPin>(pin: &mut P, what: &'static str) -> Result<bool> {
    pin.is_high()
        .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err(what)
}

impl<P: InputPin, E: Esc> KnobCore<P, E> {
    pub fn counter(&self) -> i16 {
        self.speed.counter()
    }

    pub fn command(&self) -> u16 {
        self.speed.command()
    }

    pub fn is_neutral(&self) -> bool {
        self.speed.is_neutral()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Duration of the last completed button press.
    pub fn last_hold(&self) -> Option<Duration> {
        self.button.last_hold()
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// Write neutral, seed the decoder from the current clock level and forget
    /// any press in flight. Must be called before `tick`.
    pub fn begin(&mut self) -> Result<()> {
        self.speed.arm()?;
        let clk = read_pin(&mut self.clk, "reading encoder clk")?;
        self.decoder.seed(clk);
        self.button.reset();
        self.armed = true;
        tracing::info!(command = self.speed.command(), clk, "armed");
        Ok(())
    }

    /// One pass of the control loop.
    pub fn tick(&mut self) -> Result<TickStatus> {
        if !self.armed {
            return Err(eyre::Report::new(KnobError::State(
                "tick before begin".into(),
            )));
        }

        let clk = read_pin(&mut self.clk, "reading encoder clk")?;
        let dt = read_pin(&mut self.dt, "reading encoder dt")?;
        let rotation = self.decoder.poll(clk, dt);

        let mut status = TickStatus::Idle;
        if rotation != Rotation::None {
            self.speed.on_rotation(rotation)?;
            status = TickStatus::Adjusted {
                rotation,
                counter: self.speed.counter(),
                command: self.speed.command(),
            };
        }

        // The button only matters at neutral; elsewhere it is not even sampled.
        if !self.speed.is_neutral() {
            return Ok(status);
        }
        let level = read_pin(&mut self.sw, "reading button")?;
        if self.button.poll(level, self.clock.now()) {
            let held_ms = self
                .button
                .last_hold()
                .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
            self.speed
                .emit(&TelemetryEvent::ButtonActivated { held_ms });
            if let Some(steps) = self.speed.on_button_activation()? {
                status = TickStatus::Ramped { steps };
            }
        }
        Ok(status)
    }

    /// Run the ramp immediately, as if the button had qualified.
    pub fn ramp(&mut self) -> Result<Option<usize>> {
        if !self.armed {
            return Err(eyre::Report::new(KnobError::State(
                "ramp before begin".into(),
            )));
        }
        self.speed.on_button_activation()
    }

    /// Write neutral and disarm.
    pub fn shutdown(&mut self) -> Result<()> {
        self.armed = false;
        self.speed.shutdown().wrap_err("shutdown")
    }
}
