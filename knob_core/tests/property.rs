use std::time::{Duration, Instant};

use knob_core::mocks::{RecordingEsc, SharedPin};
use knob_core::{DebouncedButton, Knob, NullTelemetry, QuadratureDecoder, Rotation};
use knob_traits::clock::test_clock::TestClock;
use proptest::prelude::*;

prop_compose! {
    fn frames()(v in prop::collection::vec((any::<bool>(), any::<bool>()), 1..400)) -> Vec<(bool, bool)> {
        v
    }
}

prop_compose! {
    fn rotations()(v in prop::collection::vec(prop_oneof![
        Just(Rotation::Cw),
        Just(Rotation::Ccw),
        Just(Rotation::None),
    ], 0..200)) -> Vec<Rotation> {
        v
    }
}

/// Drive a fresh knob through one detent per rotation (or two idle ticks for `None`).
fn drive(rotations: &[Rotation]) -> (Knob, RecordingEsc) {
    let clk = SharedPin::new(false);
    let dt = SharedPin::new(false);
    let esc = RecordingEsc::new();
    let mut knob = Knob::builder()
        .with_encoder(clk.clone(), dt.clone())
        .with_button(SharedPin::new(true))
        .with_esc(esc.clone())
        .with_clock(Box::new(TestClock::new()))
        .with_telemetry(Box::new(NullTelemetry))
        .build()
        .unwrap();
    knob.begin().unwrap();
    for r in rotations {
        clk.set(*r != Rotation::None);
        dt.set(*r == Rotation::Cw);
        knob.tick().unwrap();
        clk.set(false);
        knob.tick().unwrap();
    }
    (knob, esc)
}

proptest! {
    #[test]
    fn decoder_never_counts_without_a_rising_edge(frames in frames()) {
        let mut d = QuadratureDecoder::new();
        let mut prev = false;
        for (clk, dt) in frames {
            let r = d.poll(clk, dt);
            prop_assert!((-1..=1).contains(&r.delta()));
            if prev || !clk {
                prop_assert_eq!(r, Rotation::None);
            } else {
                prop_assert_ne!(r, Rotation::None);
            }
            prev = clk;
        }
    }

    #[test]
    fn counter_and_command_stay_in_range(rotations in rotations()) {
        let (knob, esc) = drive(&rotations);
        prop_assert!((-10..=10).contains(&knob.counter()));
        for w in esc.writes() {
            prop_assert!((1000..=2000).contains(&w));
        }
        let expected = 1500i32 + i32::from(knob.counter()) * 50;
        prop_assert_eq!(i32::from(knob.command()), expected);
    }

    #[test]
    fn counter_matches_clamped_running_sum(rotations in rotations()) {
        let (knob, _) = drive(&rotations);
        let mut model: i16 = 0;
        for r in &rotations {
            model = (model + i16::from(r.delta())).clamp(-10, 10);
        }
        prop_assert_eq!(knob.counter(), model);
    }

    #[test]
    fn idle_ticks_are_idempotent(rotations in rotations(), idle in 1usize..50) {
        let (mut knob, esc) = drive(&rotations);
        let before = (knob.counter(), knob.command(), esc.writes().len());
        for _ in 0..idle {
            knob.tick().unwrap();
        }
        prop_assert_eq!(before, (knob.counter(), knob.command(), esc.writes().len()));
    }

    #[test]
    fn button_fires_iff_hold_exceeds_threshold(threshold_ms in 1u64..5000, held_ms in 0u64..10_000) {
        let t0 = Instant::now();
        let mut b = DebouncedButton::new(Duration::from_millis(threshold_ms));
        b.poll(false, t0);
        let fired = b.poll(true, t0 + Duration::from_millis(held_ms));
        prop_assert_eq!(fired, held_ms > threshold_ms);
    }
}
