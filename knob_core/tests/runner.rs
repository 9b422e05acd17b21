use std::time::Duration;

use knob_core::mocks::{RecordingEsc, ScriptedPin, SharedPin};
use knob_core::{Knob, NullTelemetry, RampCfg, RunParams, StopReason};
use knob_traits::clock::test_clock::TestClock;
use rstest::rstest;

fn idle_knob(clock: &TestClock, esc: &RecordingEsc) -> Knob {
    Knob::builder()
        .with_encoder(SharedPin::new(false), SharedPin::new(false))
        .with_button(SharedPin::new(true))
        .with_esc(esc.clone())
        .with_clock(Box::new(clock.clone()))
        .with_telemetry(Box::new(NullTelemetry))
        .build()
        .unwrap()
}

#[rstest]
fn max_runtime_stops_cleanly_at_poll_rate() {
    let clock = TestClock::new();
    let esc = RecordingEsc::new();
    let mut knob = idle_knob(&clock, &esc);
    let params = RunParams {
        poll_hz: 1000,
        max_run_ms: Some(50),
        collect_stats: false,
    };
    let summary = knob.run(&params, || false).unwrap();
    assert_eq!(summary.stop_reason, StopReason::MaxRuntime);
    assert_eq!(summary.ticks, 50);
    assert_eq!(summary.elapsed_ms, 50);
    assert!(summary.stats.is_none());
    // armed on entry, neutral again on exit
    assert_eq!(esc.writes(), vec![1500, 1500]);
}

#[rstest]
fn stop_predicate_is_checked_before_each_tick() {
    let clock = TestClock::new();
    let esc = RecordingEsc::new();
    let mut knob = idle_knob(&clock, &esc);
    let mut calls = 0;
    let summary = knob
        .run(&RunParams::default(), || {
            calls += 1;
            calls > 7
        })
        .unwrap();
    assert_eq!(summary.stop_reason, StopReason::Requested);
    assert_eq!(summary.ticks, 7);
}

#[rstest]
fn counts_adjustments_and_ramps() {
    let clock = TestClock::new();
    let esc = RecordingEsc::new();
    // seed read, then cw, cw, ccw, ccw as rising/falling pairs
    let clk = ScriptedPin::new(
        [false, true, false, true, false, true, false, true, false],
        false,
    );
    let dt = ScriptedPin::new(
        [true, false, true, false, false, true, false, true],
        false,
    );
    // button: only read once the counter is back at zero; held across two ticks
    let sw = ScriptedPin::new([false, false, true], true);
    let mut knob = Knob::builder()
        .with_encoder(clk, dt)
        .with_button(sw)
        .with_esc(esc.clone())
        .with_clock(Box::new(clock.clone()))
        .with_ramp_cfg(RampCfg { dwell_ms: 0 })
        .with_telemetry(Box::new(NullTelemetry))
        .build()
        .unwrap();
    let press_clock = clock.clone();
    let mut ticks = 0;
    let summary = knob
        .run(
            &RunParams {
                poll_hz: 1,
                max_run_ms: None,
                collect_stats: true,
            },
            || {
                ticks += 1;
                if ticks == 9 {
                    press_clock.advance(Duration::from_millis(2000));
                }
                ticks > 12
            },
        )
        .unwrap();
    assert_eq!(summary.adjustments, 4);
    assert_eq!(summary.ramps, 1);
    assert_eq!(summary.final_counter, 0);
    assert_eq!(summary.final_command, 1500);
    let stats = summary.stats.expect("stats requested");
    assert!(stats.max_tick_us >= stats.min_tick_us);
}

#[rstest]
fn tick_error_writes_neutral_and_propagates() {
    let clock = TestClock::new();
    let esc = RecordingEsc::failing_after(1);
    let clk = ScriptedPin::new([false, true], false);
    let dt = ScriptedPin::new([true], true);
    let mut knob = Knob::builder()
        .with_encoder(clk, dt)
        .with_button(SharedPin::new(true))
        .with_esc(esc.clone())
        .with_clock(Box::new(clock.clone()))
        .with_telemetry(Box::new(NullTelemetry))
        .build()
        .unwrap();
    let err = knob
        .run(&RunParams::default(), || false)
        .expect_err("first detent write fails");
    assert!(format!("{err:#}").contains("control loop"));
    assert_eq!(esc.writes(), vec![1500]);
}

#[rstest]
fn run_continues_an_armed_knob() {
    let clock = TestClock::new();
    let esc = RecordingEsc::new();
    let mut knob = Knob::builder()
        .with_encoder(SharedPin::new(false), SharedPin::new(false))
        .with_button(SharedPin::new(true))
        .with_esc(esc.clone())
        .with_clock(Box::new(clock.clone()))
        .with_ramp_cfg(RampCfg { dwell_ms: 100 })
        .with_telemetry(Box::new(NullTelemetry))
        .build()
        .unwrap();
    knob.begin().unwrap();
    knob.ramp().unwrap();
    let after_ramp = clock.elapsed();
    let summary = knob
        .run(
            &RunParams {
                poll_hz: 100,
                max_run_ms: Some(100),
                collect_stats: false,
            },
            || false,
        )
        .unwrap();
    assert_eq!(summary.ticks, 10);
    assert_eq!(clock.elapsed() - after_ramp, Duration::from_millis(100));
    // no second arm: begin + 20 ramp steps + shutdown
    assert_eq!(esc.writes().len(), 22);
}
