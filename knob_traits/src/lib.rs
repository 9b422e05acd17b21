pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// A digital input line (encoder channel or push button).
pub trait InputPin {
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// Electronic speed controller driven by a servo-style pulse width.
pub trait Esc {
    fn set_pulse_us(
        &mut self,
        pulse_us: u16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: InputPin + ?Sized> InputPin for Box<T> {
    fn is_high(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        (**self).is_high()
    }
}

impl<T: Esc + ?Sized> Esc for Box<T> {
    fn set_pulse_us(
        &mut self,
        pulse_us: u16,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_pulse_us(pulse_us)
    }
}
