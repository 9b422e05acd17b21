//! Example: Hand-written I/O for the controller
//!
//! Any `InputPin`/`Esc` implementation can be plugged into the builder. Here
//! the encoder turns clockwise on its own and the ESC just prints pulses.

use std::cell::Cell;
use std::rc::Rc;

use knob_core::{Knob, TickStatus};
use knob_traits::{Esc, InputPin};

type PinResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Two pins fed from one free-running quadrature frame counter.
#[derive(Clone, Default)]
struct Spinner {
    frame: Rc<Cell<u32>>,
}

struct Clk(Spinner);
struct Dt(Spinner);

impl InputPin for Clk {
    fn is_high(&mut self) -> PinResult<bool> {
        let f = self.0.frame.get().wrapping_add(1);
        self.0.frame.set(f);
        Ok(f % 2 == 1)
    }
}

impl InputPin for Dt {
    fn is_high(&mut self) -> PinResult<bool> {
        Ok(self.0.frame.get() % 2 == 1)
    }
}

/// Released button.
struct Idle;

impl InputPin for Idle {
    fn is_high(&mut self) -> PinResult<bool> {
        Ok(true)
    }
}

struct PrintEsc;

impl Esc for PrintEsc {
    fn set_pulse_us(&mut self, pulse_us: u16) -> PinResult<()> {
        println!("esc <- {pulse_us} us");
        Ok(())
    }
}

fn main() -> Result<(), eyre::Report> {
    let spinner = Spinner::default();
    let mut knob = Knob::builder()
        .with_encoder(Clk(spinner.clone()), Dt(spinner))
        .with_button(Idle)
        .with_esc(PrintEsc)
        .build()?;

    knob.begin()?;
    for _ in 0..24 {
        if let TickStatus::Adjusted { counter, command, .. } = knob.tick()? {
            println!("counter {counter} -> {command} us");
        }
    }
    knob.shutdown()?;
    Ok(())
}
