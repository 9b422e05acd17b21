//! Simulated encoder panel and ESC for running the control loop without hardware.
//!
//! A `SimulatedPanel` replays a short script of operator actions:
//!
//! ```text
//! cw:3,wait:10,ccw:3,hold:1200
//! ```
//!
//! - `cw:N` / `ccw:N`: turn the knob N detents
//! - `wait:N`: leave every line untouched for N polls
//! - `hold:MS`: hold the push button for MS milliseconds, then release it
//!
//! The panel advances one frame each time the clock line is read, which the
//! control loop does exactly once per tick. The very first clock read is the
//! seed read taken while arming; it returns the resting levels and consumes
//! nothing.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use knob_traits::{Clock, Esc, InputPin};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimStep {
    Levels { clk: bool, dt: bool },
    Wait(u32),
    Hold(Duration),
}

/// Parse a comma-separated action script into panel steps.
fn parse_script(script: &str) -> Result<VecDeque<SimStep>> {
    let mut steps = VecDeque::new();
    for raw in script.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        let (action, arg) = token.split_once(':').unwrap_or((token, "1"));
        let n: u32 = arg
            .trim()
            .parse()
            .map_err(|_| HwError::Script(format!("bad count in '{token}'")))?;
        match action.trim().to_ascii_lowercase().as_str() {
            "cw" => {
                for _ in 0..n {
                    steps.push_back(SimStep::Levels { clk: true, dt: true });
                    steps.push_back(SimStep::Levels { clk: false, dt: false });
                }
            }
            "ccw" => {
                for _ in 0..n {
                    steps.push_back(SimStep::Levels { clk: true, dt: false });
                    steps.push_back(SimStep::Levels { clk: false, dt: true });
                }
            }
            "wait" => {
                if n > 0 {
                    steps.push_back(SimStep::Wait(n));
                }
            }
            "hold" => steps.push_back(SimStep::Hold(Duration::from_millis(u64::from(n)))),
            other => return Err(HwError::Script(format!("unknown action '{other}'"))),
        }
    }
    Ok(steps)
}

struct PanelState {
    steps: VecDeque<SimStep>,
    clk: bool,
    dt: bool,
    sw: bool,
    hold_started: Option<Instant>,
    primed: bool,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl PanelState {
    fn new(steps: VecDeque<SimStep>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            steps,
            clk: false,
            dt: false,
            sw: true,
            hold_started: None,
            primed: false,
            clock,
        }
    }

    fn advance(&mut self) {
        if !self.primed {
            self.primed = true;
            return;
        }
        let Some(step) = self.steps.front_mut() else {
            return;
        };
        match step {
            SimStep::Levels { clk, dt } => {
                self.clk = *clk;
                self.dt = *dt;
                self.steps.pop_front();
            }
            SimStep::Wait(left) => {
                *left = left.saturating_sub(1);
                if *left == 0 {
                    self.steps.pop_front();
                }
            }
            SimStep::Hold(hold) => {
                let hold = *hold;
                let now = self.clock.now();
                match self.hold_started {
                    None => {
                        self.sw = false;
                        self.hold_started = Some(now);
                        debug!(
                            hold_ms = u64::try_from(hold.as_millis()).unwrap_or(u64::MAX),
                            "sim button pressed"
                        );
                    }
                    Some(since) if now.saturating_duration_since(since) >= hold => {
                        self.sw = true;
                        self.hold_started = None;
                        self.steps.pop_front();
                        debug!("sim button released");
                    }
                    Some(_) => {}
                }
            }
        }
        trace!(clk = self.clk, dt = self.dt, sw = self.sw, "sim panel frame");
    }
}

/// Scripted encoder + push button. Clones share the same state.
#[derive(Clone)]
pub struct SimulatedPanel {
    state: Rc<RefCell<PanelState>>,
}

impl SimulatedPanel {
    /// Build a panel from an action script. Lines idle at clk=low, dt=low, sw=high.
    pub fn from_script(script: &str, clock: Arc<dyn Clock + Send + Sync>) -> Result<Self> {
        let steps = parse_script(script)?;
        Ok(Self {
            state: Rc::new(RefCell::new(PanelState::new(steps, clock))),
        })
    }

    /// A panel nobody touches.
    pub fn idle(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            state: Rc::new(RefCell::new(PanelState::new(VecDeque::new(), clock))),
        }
    }

    /// True once every scripted action has been played back and the button is released.
    pub fn is_finished(&self) -> bool {
        let s = self.state.borrow();
        s.steps.is_empty() && s.sw
    }

    /// Encoder clock line. Reading it advances the script by one frame.
    pub fn clk_pin(&self) -> SimPin {
        SimPin {
            state: self.state.clone(),
            line: Line::Clk,
        }
    }

    /// Encoder data line.
    pub fn dt_pin(&self) -> SimPin {
        SimPin {
            state: self.state.clone(),
            line: Line::Dt,
        }
    }

    /// Push button line (active low).
    pub fn sw_pin(&self) -> SimPin {
        SimPin {
            state: self.state.clone(),
            line: Line::Sw,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Line {
    Clk,
    Dt,
    Sw,
}

/// One line of a `SimulatedPanel`.
pub struct SimPin {
    state: Rc<RefCell<PanelState>>,
    line: Line,
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut s = self.state.borrow_mut();
        Ok(match self.line {
            Line::Clk => {
                s.advance();
                s.clk
            }
            Line::Dt => s.dt,
            Line::Sw => s.sw,
        })
    }
}

/// Simulated ESC that records every pulse width it is given.
#[derive(Clone, Default)]
pub struct SimulatedEsc {
    history: Rc<RefCell<Vec<u16>>>,
}

impl SimulatedEsc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last pulse width written, if any.
    pub fn last_pulse_us(&self) -> Option<u16> {
        self.history.borrow().last().copied()
    }

    /// All pulse widths written so far.
    pub fn history(&self) -> Vec<u16> {
        self.history.borrow().clone()
    }
}

impl Esc for SimulatedEsc {
    fn set_pulse_us(
        &mut self,
        pulse_us: u16,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        debug!(pulse_us, "esc pulse (simulated)");
        self.history.borrow_mut().push(pulse_us);
        Ok(())
    }
}
