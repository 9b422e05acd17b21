//! I/O bindings for the knob controller: a scripted simulator for
//! development and, behind the `hardware` feature, rppal GPIO/PWM drivers.

pub mod error;
pub mod sim;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

pub use sim::{SimPin, SimulatedEsc, SimulatedPanel};

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::{GpioInput, PwmEsc};

/// Encoder clock, encoder data and push-button lines opened on real GPIO.
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn open_panel(
    clk: u8,
    dt: u8,
    sw: u8,
) -> error::Result<(GpioInput, GpioInput, GpioInput)> {
    let gpio =
        rppal::gpio::Gpio::new().map_err(|e| error::HwError::Gpio(format!("open gpio: {e}")))?;
    Ok((
        GpioInput::open(&gpio, clk)?,
        GpioInput::open(&gpio, dt)?,
        GpioInput::open(&gpio, sw)?,
    ))
}
