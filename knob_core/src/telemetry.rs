//! Observational status events and the sinks that consume them.
//!
//! Nothing in the control path depends on a sink succeeding: file sinks drop
//! lines they cannot write and log a warning instead.

use std::cell::RefCell;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use crate::decoder::Rotation;
use crate::speed::RampPhase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// Neutral written, controller ready.
    Armed { command: u16 },
    Rotated {
        direction: Rotation,
        counter: i16,
        command: u16,
    },
    ButtonActivated { held_ms: u64 },
    /// A ramp phase is starting.
    RampPhase { phase: RampPhase },
    RampStep { phase: RampPhase, command: u16 },
    RampCompleted { steps: usize },
    /// Neutral written on shutdown.
    Stopped { command: u16 },
}

impl fmt::Display for TelemetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Armed { command } => write!(f, "Armed | Speed: {command}"),
            Self::Rotated {
                direction,
                counter,
                command,
            } => write!(
                f,
                "Direction: {direction} | Counter: {counter} | Speed: {command}"
            ),
            Self::ButtonActivated { .. } => f.write_str("Button Pressed detected!"),
            Self::RampPhase { phase } => f.write_str(phase.label()),
            Self::RampStep { command, .. } => write!(f, "Speed: {command}"),
            Self::RampCompleted { .. } => f.write_str("Auto Speed Completed."),
            Self::Stopped { command } => write!(f, "Stopped | Speed: {command}"),
        }
    }
}

pub trait Telemetry {
    fn emit(&mut self, event: &TelemetryEvent);
}

impl<T: Telemetry + ?Sized> Telemetry for Box<T> {
    fn emit(&mut self, event: &TelemetryEvent) {
        (**self).emit(event);
    }
}

/// Fan an event out to several sinks in order.
impl Telemetry for Vec<Box<dyn Telemetry>> {
    fn emit(&mut self, event: &TelemetryEvent) {
        for sink in self.iter_mut() {
            sink.emit(event);
        }
    }
}

/// Default sink: structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn emit(&mut self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::Rotated {
                direction,
                counter,
                command,
            } => tracing::info!(direction = %direction, counter, command, "rotated"),
            TelemetryEvent::RampStep { phase, command } => {
                tracing::debug!(phase = phase.label(), command, "ramp step");
            }
            TelemetryEvent::ButtonActivated { held_ms } => {
                tracing::info!(held_ms, "button activated");
            }
            TelemetryEvent::RampCompleted { steps } => tracing::info!(steps, "ramp completed"),
            other => tracing::info!("{other}"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn emit(&mut self, _event: &TelemetryEvent) {}
}

/// Appends one human-readable line per event to a file.
pub struct FileTelemetry {
    path: PathBuf,
    file: Option<File>,
    failed: bool,
}

impl FileTelemetry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            failed: false,
        }
    }

    fn writer(&mut self) -> Option<&mut File> {
        if self.file.is_none() && !self.failed {
            match OpenOptions::new().create(true).append(true).open(&self.path) {
                Ok(f) => self.file = Some(f),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "telemetry file unavailable");
                    self.failed = true;
                }
            }
        }
        self.file.as_mut()
    }
}

impl Telemetry for FileTelemetry {
    fn emit(&mut self, event: &TelemetryEvent) {
        let Some(file) = self.writer() else {
            return;
        };
        if let Err(e) = writeln!(file, "{event}") {
            tracing::warn!(error = %e, "telemetry write failed");
        }
    }
}

/// Keeps every event in memory. Clones share the same buffer, so a test can
/// keep one handle and give the other to the controller.
#[derive(Debug, Default, Clone)]
pub struct RecordingTelemetry {
    events: Rc<RefCell<Vec<TelemetryEvent>>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Telemetry for RecordingTelemetry {
    fn emit(&mut self, event: &TelemetryEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
