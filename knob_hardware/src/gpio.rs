//! Raspberry Pi backend: rppal GPIO inputs and hardware PWM for the ESC.

use std::time::Duration;

use knob_traits::{Esc, InputPin};
use rppal::gpio::Gpio;
use rppal::pwm::{Channel, Polarity, Pwm};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

/// GPIO input with the internal pull-up enabled (encoder modules and the
/// push button idle high).
pub struct GpioInput {
    pin: rppal::gpio::InputPin,
    bcm: u8,
}

impl GpioInput {
    pub fn open(gpio: &Gpio, bcm: u8) -> Result<Self> {
        let pin = gpio
            .get(bcm)
            .map_err(|e| HwError::Gpio(format!("open input pin {bcm}: {e}")))?
            .into_input_pullup();
        debug!(bcm, "gpio input ready");
        Ok(Self { pin, bcm })
    }
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let high = self.pin.is_high();
        trace!(bcm = self.bcm, high, "gpio read");
        Ok(high)
    }
}

/// ESC on a hardware PWM channel. Pulse widths outside `[min_us, max_us]`
/// are refused rather than forwarded.
pub struct PwmEsc {
    pwm: Pwm,
    min_us: u16,
    max_us: u16,
}

impl PwmEsc {
    pub fn open(
        channel: u8,
        period: Duration,
        neutral_us: u16,
        min_us: u16,
        max_us: u16,
    ) -> Result<Self> {
        let ch = match channel {
            0 => Channel::Pwm0,
            1 => Channel::Pwm1,
            other => return Err(HwError::Pwm(format!("no such pwm channel {other}"))),
        };
        let pwm = Pwm::with_period(
            ch,
            period,
            Duration::from_micros(u64::from(neutral_us)),
            Polarity::Normal,
            true,
        )
        .map_err(|e| HwError::Pwm(format!("open pwm channel {channel}: {e}")))?;
        debug!(
            channel,
            period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            neutral_us,
            "esc pwm ready"
        );
        Ok(Self { pwm, min_us, max_us })
    }
}

impl Esc for PwmEsc {
    fn set_pulse_us(
        &mut self,
        pulse_us: u16,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !(self.min_us..=self.max_us).contains(&pulse_us) {
            return Err(Box::new(HwError::PulseOutOfRange {
                pulse_us,
                min_us: self.min_us,
                max_us: self.max_us,
            }));
        }
        self.pwm
            .set_pulse_width(Duration::from_micros(u64::from(pulse_us)))
            .map_err(|e| Box::new(HwError::Pwm(e.to_string())))?;
        trace!(pulse_us, "esc pulse");
        Ok(())
    }
}
