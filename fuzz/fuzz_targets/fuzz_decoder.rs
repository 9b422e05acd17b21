#![no_main]
use knob_core::{QuadratureDecoder, Rotation, SpeedCounter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u8, u16, Vec<(bool, bool)>)| {
    let (debounce, max_steps, frames) = input;
    let max_steps = max_steps.max(1) % 1000 + 1;
    let mut decoder = QuadratureDecoder::with_debounce(debounce % 8);
    let mut counter = SpeedCounter::new(max_steps);
    let limit = i16::try_from(max_steps).unwrap_or(i16::MAX);
    for (clk, dt) in frames {
        let rotation = decoder.poll(clk, dt);
        if rotation != Rotation::None {
            counter.apply(rotation.delta());
        }
        assert!((-limit..=limit).contains(&counter.value()));
    }
});
