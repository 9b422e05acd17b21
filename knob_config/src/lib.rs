#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the knob controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section except `[pins]` has defaults matching the stock
//!   1000..2000 µs ESC wiring.
//! - Everything also serializes, so the CLI can print the effective config.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// BCM pin numbers and the PWM channel driving the ESC.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Pins {
    pub encoder_clk: u8,
    pub encoder_dt: u8,
    pub encoder_sw: u8,
    /// Hardware PWM channel (0 or 1).
    #[serde(default)]
    pub esc_pwm_channel: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EscCfg {
    /// Zero-speed pulse width (µs).
    pub neutral_us: u16,
    /// Full counter-clockwise pulse width (µs).
    pub min_us: u16,
    /// Full clockwise pulse width (µs).
    pub max_us: u16,
    /// Pulse change per encoder detent (µs).
    pub step_us: u16,
    /// PWM frame period (ms).
    pub period_ms: u64,
}

impl Default for EscCfg {
    fn default() -> Self {
        Self {
            neutral_us: 1500,
            min_us: 1000,
            max_us: 2000,
            step_us: 50,
            period_ms: 20,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EncoderCfg {
    /// Detents away from neutral before the counter saturates.
    pub max_steps: u16,
    /// Consecutive polls a clock level must hold before it counts (0/1 = off).
    pub debounce_polls: u8,
}

impl Default for EncoderCfg {
    fn default() -> Self {
        Self {
            max_steps: 10,
            debounce_polls: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ButtonCfg {
    /// Minimum hold time (ms) before a release activates the ramp; strictly exceeded.
    pub hold_ms: u64,
}

impl Default for ButtonCfg {
    fn default() -> Self {
        Self { hold_ms: 1000 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RampCfg {
    /// Time each ramp step is held (ms).
    pub dwell_ms: u64,
}

impl Default for RampCfg {
    fn default() -> Self {
        Self { dwell_ms: 500 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RunnerCfg {
    /// Polling rate of the control loop.
    pub poll_hz: u32,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self { poll_hz: 1000 }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(default)]
pub struct TelemetryCfg {
    /// Append human-readable status lines to this file.
    pub file: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub esc: EscCfg,
    #[serde(default)]
    pub encoder: EncoderCfg,
    #[serde(default)]
    pub button: ButtonCfg,
    #[serde(default)]
    pub ramp: RampCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub telemetry: TelemetryCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        let pins = [
            self.pins.encoder_clk,
            self.pins.encoder_dt,
            self.pins.encoder_sw,
        ];
        let unique: HashSet<u8> = pins.iter().copied().collect();
        if unique.len() != pins.len() {
            eyre::bail!("pins.encoder_clk, encoder_dt and encoder_sw must be distinct");
        }
        if pins.iter().any(|p| *p > 27) {
            eyre::bail!("pins must be BCM numbers in 0..=27");
        }
        if self.pins.esc_pwm_channel > 1 {
            eyre::bail!("pins.esc_pwm_channel must be 0 or 1");
        }

        // ESC
        let esc = &self.esc;
        if esc.min_us >= esc.max_us {
            eyre::bail!("esc.min_us must be < esc.max_us");
        }
        if !(esc.min_us < esc.neutral_us && esc.neutral_us < esc.max_us) {
            eyre::bail!("esc.neutral_us must lie strictly between min_us and max_us");
        }
        if esc.step_us == 0 {
            eyre::bail!("esc.step_us must be > 0");
        }
        if (esc.max_us - esc.neutral_us) % esc.step_us != 0 {
            eyre::bail!("esc.max_us - esc.neutral_us must be a whole number of step_us");
        }
        if esc.period_ms == 0 {
            eyre::bail!("esc.period_ms must be >= 1");
        }
        if esc.period_ms.saturating_mul(1000) <= u64::from(esc.max_us) {
            eyre::bail!("esc.period_ms must be longer than the max pulse width");
        }

        // Encoder
        if self.encoder.max_steps == 0 {
            eyre::bail!("encoder.max_steps must be >= 1");
        }
        let span = u32::from(self.encoder.max_steps) * u32::from(esc.step_us);
        if u32::from(esc.neutral_us) + span > u32::from(esc.max_us)
            || u32::from(esc.neutral_us) < u32::from(esc.min_us) + span
        {
            eyre::bail!("encoder.max_steps * esc.step_us exceeds the esc range around neutral");
        }

        // Button
        if self.button.hold_ms == 0 {
            eyre::bail!("button.hold_ms must be >= 1");
        }
        if self.button.hold_ms > 60 * 1000 {
            eyre::bail!("button.hold_ms is unreasonably large (>60s)");
        }

        // Ramp
        if self.ramp.dwell_ms > 60 * 1000 {
            eyre::bail!("ramp.dwell_ms is unreasonably large (>60s)");
        }

        // Runner
        if self.runner.poll_hz == 0 {
            eyre::bail!("runner.poll_hz must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
