//! Test and helper mocks for knob_core.
//!
//! Every mock hands out clones that share state, so a test keeps one handle
//! to drive or inspect while the controller owns the other.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::error::Error;
use std::rc::Rc;

type BoxError = Box<dyn Error + Send + Sync>;

/// An input line whose level the test sets directly.
#[derive(Debug, Clone)]
pub struct SharedPin {
    level: Rc<Cell<bool>>,
}

impl SharedPin {
    pub fn new(level: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(level)),
        }
    }

    pub fn set(&self, level: bool) {
        self.level.set(level);
    }

    pub fn get(&self) -> bool {
        self.level.get()
    }
}

impl knob_traits::InputPin for SharedPin {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        Ok(self.level.get())
    }
}

/// Replays a fixed list of levels, then repeats the last one.
#[derive(Debug, Clone)]
pub struct ScriptedPin {
    levels: Rc<RefCell<VecDeque<bool>>>,
    last: Rc<Cell<bool>>,
}

impl ScriptedPin {
    pub fn new(levels: impl IntoIterator<Item = bool>, idle: bool) -> Self {
        Self {
            levels: Rc::new(RefCell::new(levels.into_iter().collect())),
            last: Rc::new(Cell::new(idle)),
        }
    }

    pub fn remaining(&self) -> usize {
        self.levels.borrow().len()
    }
}

impl knob_traits::InputPin for ScriptedPin {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        if let Some(level) = self.levels.borrow_mut().pop_front() {
            self.last.set(level);
        }
        Ok(self.last.get())
    }
}

/// A pin that always fails to read.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrokenPin;

impl knob_traits::InputPin for BrokenPin {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        Err(Box::new(std::io::Error::other("pin read failed")))
    }
}

/// Records every pulse written. Optionally starts failing after a number of
/// writes, or refuses one particular pulse width.
#[derive(Debug, Clone, Default)]
pub struct RecordingEsc {
    writes: Rc<RefCell<Vec<u16>>>,
    fail_after: Option<usize>,
    reject: Option<u16>,
}

impl RecordingEsc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` writes, then reject the rest.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    /// Reject every write of `pulse_us`; accept everything else.
    pub fn rejecting(pulse_us: u16) -> Self {
        Self {
            reject: Some(pulse_us),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<u16> {
        self.writes.borrow().clone()
    }

    pub fn last(&self) -> Option<u16> {
        self.writes.borrow().last().copied()
    }
}

impl knob_traits::Esc for RecordingEsc {
    fn set_pulse_us(&mut self, pulse_us: u16) -> Result<(), BoxError> {
        let mut writes = self.writes.borrow_mut();
        if let Some(n) = self.fail_after
            && writes.len() >= n
        {
            return Err(Box::new(std::io::Error::other("esc rejected pulse")));
        }
        if self.reject == Some(pulse_us) {
            return Err(Box::new(std::io::Error::other(format!(
                "esc refused {pulse_us}us"
            ))));
        }
        writes.push(pulse_us);
        Ok(())
    }
}
