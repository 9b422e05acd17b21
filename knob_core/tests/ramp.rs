use std::time::Duration;

use knob_core::mocks::{RecordingEsc, SharedPin};
use knob_core::{
    EncoderCfg, EscCfg, Knob, RampCfg, RampPhase, RampSequence, RecordingTelemetry,
    TelemetryEvent,
};
use knob_traits::clock::test_clock::TestClock;
use rstest::rstest;

fn knob_with(
    esc_cfg: EscCfg,
    max_steps: u16,
    dwell_ms: u64,
) -> (Knob, RecordingEsc, TestClock, RecordingTelemetry) {
    let esc = RecordingEsc::new();
    let clock = TestClock::new();
    let telemetry = RecordingTelemetry::new();
    let mut knob = Knob::builder()
        .with_encoder(SharedPin::new(false), SharedPin::new(false))
        .with_button(SharedPin::new(true))
        .with_esc(esc.clone())
        .with_esc_cfg(esc_cfg)
        .with_encoder_cfg(EncoderCfg {
            max_steps,
            debounce_polls: 0,
        })
        .with_ramp_cfg(RampCfg { dwell_ms })
        .with_clock(Box::new(clock.clone()))
        .with_telemetry(Box::new(telemetry.clone()))
        .build()
        .expect("build");
    knob.begin().expect("begin");
    (knob, esc, clock, telemetry)
}

#[rstest]
fn default_ramp_sequence_and_dwell() {
    let (mut knob, esc, clock, _) = knob_with(EscCfg::default(), 10, 500);
    assert_eq!(knob.counter(), 0);

    assert_eq!(knob.ramp().unwrap(), Some(20));

    let expected: Vec<u16> = [
        1550, 1600, 1650, 1700, 1750, 1800, 1850, 1900, 1950, 2000, 1950, 1900, 1850, 1800, 1750,
        1700, 1650, 1600, 1550, 1500,
    ]
    .to_vec();
    assert_eq!(&esc.writes()[1..], expected.as_slice());
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(500); 20]);
    assert_eq!(clock.elapsed(), Duration::from_millis(10_000));
    assert_eq!(knob.counter(), 0);
}

#[rstest]
fn telemetry_brackets_each_phase() {
    let (mut knob, _, _, telemetry) = knob_with(EscCfg::default(), 10, 0);
    telemetry.clear();
    knob.ramp().unwrap();
    let lines: Vec<String> = telemetry.events().iter().map(ToString::to_string).collect();
    assert_eq!(lines[0], "Accelerating");
    assert_eq!(lines[1], "Speed: 1550");
    assert_eq!(lines[10], "Speed: 2000");
    assert_eq!(lines[11], "De-accelerating");
    assert_eq!(lines[12], "Speed: 1950");
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Auto Speed Completed.")
    );
    assert_eq!(lines.len(), 23);
}

#[rstest]
fn zero_dwell_does_not_sleep() {
    let (mut knob, _, clock, _) = knob_with(EscCfg::default(), 10, 0);
    knob.ramp().unwrap();
    assert!(clock.sleeps().is_empty());
}

#[rstest]
#[case(EscCfg { neutral_us: 1500, min_us: 1000, max_us: 2000, step_us: 100 }, 5, 10)]
#[case(EscCfg { neutral_us: 1500, min_us: 1000, max_us: 2000, step_us: 250 }, 2, 4)]
#[case(EscCfg { neutral_us: 1000, min_us: 900, max_us: 1100, step_us: 100 }, 1, 2)]
fn ramp_length_follows_range_and_step(
    #[case] esc_cfg: EscCfg,
    #[case] max_steps: u16,
    #[case] steps: usize,
) {
    let (mut knob, esc, _, _) = knob_with(esc_cfg, max_steps, 1);
    assert_eq!(knob.ramp().unwrap(), Some(steps));
    let writes = esc.writes();
    assert_eq!(writes.iter().max(), Some(&esc_cfg.max_us));
    assert_eq!(writes.last(), Some(&esc_cfg.neutral_us));
}

#[rstest]
fn sequence_phases_are_contiguous() {
    let phases: Vec<RampPhase> = RampSequence::new(&EscCfg::default())
        .map(|s| s.phase)
        .collect();
    let switch = phases
        .iter()
        .position(|p| *p == RampPhase::Decelerating)
        .expect("has a way down");
    assert_eq!(switch, 10);
    assert!(phases[switch..].iter().all(|p| *p == RampPhase::Decelerating));
}

#[rstest]
fn ramp_completed_event_reports_step_count() {
    let (mut knob, _, _, telemetry) = knob_with(EscCfg::default(), 10, 0);
    knob.ramp().unwrap();
    assert_eq!(
        telemetry.events().last(),
        Some(&TelemetryEvent::RampCompleted { steps: 20 })
    );
}
