#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validate arbitrary TOML; errors are fine, panics are not.
    if let Ok(cfg) = knob_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        // A validated config never commands a pulse past the ESC limits.
        let knob = knob_core::KnobCfg::from(&cfg);
        let top = i16::try_from(knob.encoder.max_steps).unwrap_or(i16::MAX);
        assert!(knob.esc.command_for(top) <= knob.esc.max_us);
        assert!(knob.esc.command_for(-top) >= knob.esc.min_us);
    }
});
