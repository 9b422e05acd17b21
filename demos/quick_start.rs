//! Quick Start Example
//!
//! Drives the knob controller from a scripted simulated panel: three detents
//! clockwise, one back, then a long press that runs the ramp.
//!
//! Run with `cargo run -p knob_core --example quick_start`.

use std::sync::Arc;

use knob_core::{Knob, KnobCfg, RampCfg, RunParams};
use knob_hardware::{SimulatedEsc, SimulatedPanel};
use knob_traits::MonotonicClock;

fn main() -> Result<(), eyre::Report> {
    let panel = SimulatedPanel::from_script(
        "cw:3,wait:50,ccw:1,wait:50,ccw:2,hold:1200",
        Arc::new(MonotonicClock::new()),
    )?;
    let esc = SimulatedEsc::new();

    // Shorter dwell so the demo ramp finishes in about a second.
    let cfg = KnobCfg {
        ramp: RampCfg { dwell_ms: 50 },
        ..KnobCfg::default()
    };

    let mut knob = Knob::builder()
        .with_encoder(panel.clk_pin(), panel.dt_pin())
        .with_button(panel.sw_pin())
        .with_esc(esc.clone())
        .with_cfg(cfg)
        .build()?;

    let summary = knob.run(&RunParams::default(), || panel.is_finished())?;
    println!(
        "{} ticks, {} adjustments, {} ramps; ESC saw {} pulses ending at {:?} us",
        summary.ticks,
        summary.adjustments,
        summary.ramps,
        esc.history().len(),
        esc.last_pulse_us(),
    );
    Ok(())
}
