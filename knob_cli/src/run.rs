//! Command bodies: I/O backend assembly, knob construction and output.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use knob_config::Config;
use knob_core::{
    FileTelemetry, Knob, KnobCfg, RunParams, RunSummary, Telemetry, TelemetryEvent,
};
use knob_hardware::{SimulatedEsc, SimulatedPanel};
use knob_traits::{Esc, InputPin, MonotonicClock};
use serde_json::json;

/// Pins and ESC the knob will drive, plus the simulated panel when there is one.
pub struct Backend {
    pub clk: Box<dyn InputPin>,
    pub dt: Box<dyn InputPin>,
    pub sw: Box<dyn InputPin>,
    pub esc: Box<dyn Esc>,
    pub panel: Option<SimulatedPanel>,
    pub name: &'static str,
}

fn sim_backend(sim_script: Option<&str>) -> eyre::Result<Backend> {
    let clock = Arc::new(MonotonicClock::new());
    let panel = match sim_script {
        Some(script) => SimulatedPanel::from_script(script, clock)
            .map_err(eyre::Report::new)
            .wrap_err("sim script")?,
        None => SimulatedPanel::idle(clock),
    };
    Ok(Backend {
        clk: Box::new(panel.clk_pin()),
        dt: Box::new(panel.dt_pin()),
        sw: Box::new(panel.sw_pin()),
        esc: Box::new(SimulatedEsc::new()),
        panel: Some(panel),
        name: "sim",
    })
}

/// Real GPIO/PWM unless a sim script was given.
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn open_backend(cfg: &Config, sim_script: Option<&str>) -> eyre::Result<Backend> {
    if sim_script.is_some() {
        return sim_backend(sim_script);
    }
    let (clk, dt, sw) = knob_hardware::open_panel(
        cfg.pins.encoder_clk,
        cfg.pins.encoder_dt,
        cfg.pins.encoder_sw,
    )
    .map_err(eyre::Report::new)
    .wrap_err("open encoder pins")?;
    let esc = knob_hardware::PwmEsc::open(
        cfg.pins.esc_pwm_channel,
        std::time::Duration::from_millis(cfg.esc.period_ms),
        cfg.esc.neutral_us,
        cfg.esc.min_us,
        cfg.esc.max_us,
    )
    .map_err(eyre::Report::new)
    .wrap_err("open esc pwm")?;
    Ok(Backend {
        clk: Box::new(clk),
        dt: Box::new(dt),
        sw: Box::new(sw),
        esc: Box::new(esc),
        panel: None,
        name: "gpio",
    })
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn open_backend(_cfg: &Config, sim_script: Option<&str>) -> eyre::Result<Backend> {
    sim_backend(sim_script)
}

/// Status events on stdout: the classic one-line format, or JSON lines.
pub struct ConsoleTelemetry {
    pub json: bool,
}

pub fn event_json(event: &TelemetryEvent) -> serde_json::Value {
    match event {
        TelemetryEvent::Armed { command } => json!({ "event": "armed", "command": command }),
        TelemetryEvent::Rotated {
            direction,
            counter,
            command,
        } => json!({
            "event": "rotated",
            "direction": direction.label(),
            "counter": counter,
            "command": command,
        }),
        TelemetryEvent::ButtonActivated { held_ms } => {
            json!({ "event": "button", "held_ms": held_ms })
        }
        TelemetryEvent::RampPhase { phase } => {
            json!({ "event": "ramp_phase", "phase": phase.label() })
        }
        TelemetryEvent::RampStep { phase, command } => json!({
            "event": "ramp_step",
            "phase": phase.label(),
            "command": command,
        }),
        TelemetryEvent::RampCompleted { steps } => {
            json!({ "event": "ramp_completed", "steps": steps })
        }
        TelemetryEvent::Stopped { command } => json!({ "event": "stopped", "command": command }),
    }
}

impl Telemetry for ConsoleTelemetry {
    fn emit(&mut self, event: &TelemetryEvent) {
        if self.json {
            println!("{}", event_json(event));
        } else {
            println!("{event}");
        }
    }
}

fn telemetry_for(cfg: &Config, json: bool) -> Box<dyn Telemetry> {
    let mut sinks: Vec<Box<dyn Telemetry>> = vec![Box::new(ConsoleTelemetry { json })];
    if let Some(path) = cfg.telemetry.file.as_deref() {
        sinks.push(Box::new(FileTelemetry::new(path)));
    }
    Box::new(sinks)
}

/// Build the knob over a backend with the config's ESC/encoder/button/ramp sections.
pub fn assemble(cfg: &Config, backend: Backend, json: bool) -> eyre::Result<Knob> {
    Knob::builder()
        .with_encoder(backend.clk, backend.dt)
        .with_button(backend.sw)
        .with_esc(backend.esc)
        .with_cfg(KnobCfg::from(cfg))
        .with_telemetry(telemetry_for(cfg, json))
        .build()
}

pub fn run_loop(
    cfg: &Config,
    json: bool,
    max_run_ms: Option<u64>,
    sim_script: Option<&str>,
    stats: bool,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<RunSummary> {
    let backend = open_backend(cfg, sim_script)?;
    // Only a scripted panel has an end; an idle one runs until stopped.
    let scripted = sim_script.and(backend.panel.clone());
    let backend_name = backend.name;
    let mut knob = assemble(cfg, backend, json)?;
    tracing::info!(backend = backend_name, poll_hz = cfg.runner.poll_hz, "run start");

    let params = RunParams {
        poll_hz: cfg.runner.poll_hz,
        max_run_ms,
        collect_stats: stats,
    };
    knob.run(&params, || {
        shutdown.load(Ordering::Relaxed) || scripted.as_ref().is_some_and(SimulatedPanel::is_finished)
    })
}

pub fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        let stats = summary.stats.map(|s| {
            json!({
                "min_tick_us": s.min_tick_us,
                "max_tick_us": s.max_tick_us,
                "mean_tick_us": s.mean_tick_us,
                "overruns": s.overruns,
            })
        });
        println!(
            "{}",
            json!({
                "event": "summary",
                "stop_reason": summary.stop_reason.as_str(),
                "ticks": summary.ticks,
                "adjustments": summary.adjustments,
                "ramps": summary.ramps,
                "final_counter": summary.final_counter,
                "final_command": summary.final_command,
                "elapsed_ms": summary.elapsed_ms,
                "stats": stats,
            })
        );
        return;
    }
    println!(
        "Run stopped ({}): {} ticks, {} adjustments, {} ramps in {} ms. Counter: {} | Speed: {}",
        summary.stop_reason.as_str(),
        summary.ticks,
        summary.adjustments,
        summary.ramps,
        summary.elapsed_ms,
        summary.final_counter,
        summary.final_command,
    );
    if let Some(s) = summary.stats {
        println!(
            "Loop stats: min {} us, max {} us, mean {} us, overruns {}",
            s.min_tick_us, s.max_tick_us, s.mean_tick_us, s.overruns
        );
    }
}

/// Arm, run a single ramp, write neutral.
pub fn ramp_once(cfg: &Config, json: bool) -> eyre::Result<usize> {
    let backend = open_backend(cfg, None)?;
    let mut knob = assemble(cfg, backend, json)?;
    knob.begin()?;
    let steps = knob.ramp()?.unwrap_or(0);
    knob.shutdown()?;
    Ok(steps)
}

/// Open the backend, build the knob and cycle the ESC through arm/shutdown.
pub fn self_check(cfg: &Config) -> eyre::Result<&'static str> {
    let backend = open_backend(cfg, None)?;
    let name = backend.name;
    let mut knob = Knob::builder()
        .with_encoder(backend.clk, backend.dt)
        .with_button(backend.sw)
        .with_esc(backend.esc)
        .with_cfg(KnobCfg::from(cfg))
        .with_telemetry(Box::new(knob_core::NullTelemetry))
        .build()?;
    knob.begin()?;
    knob.shutdown()?;
    Ok(name)
}
