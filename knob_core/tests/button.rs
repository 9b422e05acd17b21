use std::time::{Duration, Instant};

use knob_core::DebouncedButton;
use rstest::rstest;

fn press_for(button: &mut DebouncedButton, t0: Instant, held_ms: u64) -> bool {
    assert!(!button.poll(true, t0));
    assert!(!button.poll(false, t0));
    button.poll(true, t0 + Duration::from_millis(held_ms))
}

#[rstest]
#[case(1200, true)]
#[case(1001, true)]
#[case(1000, false)]
#[case(800, false)]
#[case(0, false)]
fn fires_only_when_hold_strictly_exceeds_threshold(#[case] held_ms: u64, #[case] fires: bool) {
    let mut b = DebouncedButton::new(Duration::from_millis(1000));
    assert_eq!(press_for(&mut b, Instant::now(), held_ms), fires);
    assert_eq!(b.last_hold(), Some(Duration::from_millis(held_ms)));
}

#[rstest]
fn bounce_on_press_restarts_the_timer() {
    let t0 = Instant::now();
    let mut b = DebouncedButton::new(Duration::from_millis(100));
    b.poll(false, t0);
    // short bounce: release after 2 ms fails the gate
    assert!(!b.poll(true, t0 + Duration::from_millis(2)));
    b.poll(false, t0 + Duration::from_millis(3));
    assert!(!b.poll(true, t0 + Duration::from_millis(100)));
    b.poll(false, t0 + Duration::from_millis(200));
    assert!(b.poll(true, t0 + Duration::from_millis(301)));
}

#[rstest]
fn holding_low_never_fires_by_itself() {
    let t0 = Instant::now();
    let mut b = DebouncedButton::new(Duration::from_millis(10));
    b.poll(false, t0);
    for i in 1..50 {
        assert!(!b.poll(false, t0 + Duration::from_millis(i * 100)));
    }
    assert!(b.is_pressed());
}

#[rstest]
fn released_line_at_power_up_is_not_a_press() {
    let t0 = Instant::now();
    let mut b = DebouncedButton::new(Duration::from_millis(10));
    for i in 0..5 {
        assert!(!b.poll(true, t0 + Duration::from_secs(i * 2)));
    }
    assert!(!b.is_pressed());
    assert!(b.last_hold().is_none());
}
