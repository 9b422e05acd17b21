use knob_config::{load_file, load_toml};
use rstest::rstest;
use std::fs;
use tempfile::tempdir;

const PINS: &str = r#"
[pins]
encoder_clk = 17
encoder_dt = 27
encoder_sw = 22
"#;

fn with_pins(extra: &str) -> String {
    format!("{PINS}\n{extra}")
}

#[rstest]
#[case("[esc]\nmin_us = 2000\nmax_us = 1000", "min_us must be < esc.max_us")]
#[case("[esc]\nneutral_us = 1000", "neutral_us must lie strictly between")]
#[case("[esc]\nstep_us = 0", "step_us must be > 0")]
#[case("[esc]\nstep_us = 30", "whole number of step_us")]
#[case("[esc]\nperiod_ms = 2", "longer than the max pulse width")]
#[case("[encoder]\nmax_steps = 0", "max_steps must be >= 1")]
#[case("[encoder]\nmax_steps = 11", "exceeds the esc range")]
#[case("[button]\nhold_ms = 0", "hold_ms must be >= 1")]
#[case("[runner]\npoll_hz = 0", "poll_hz must be > 0")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation")]
fn rejects_out_of_range_values(#[case] extra: &str, #[case] needle: &str) {
    let cfg = load_toml(&with_pins(extra)).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error '{err}' does not mention '{needle}'"
    );
}

#[rstest]
fn rejects_shared_pins() {
    let toml = r#"
[pins]
encoder_clk = 17
encoder_dt = 17
encoder_sw = 22
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("duplicate pins");
    assert!(format!("{err}").contains("distinct"));
}

#[rstest]
fn rejects_bad_pwm_channel() {
    let toml = r#"
[pins]
encoder_clk = 17
encoder_dt = 27
encoder_sw = 22
esc_pwm_channel = 2
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    assert!(cfg.validate().is_err());
}

#[rstest]
fn accepts_full_config() {
    let toml = r#"
[pins]
encoder_clk = 17
encoder_dt = 27
encoder_sw = 22
esc_pwm_channel = 1

[esc]
neutral_us = 1500
min_us = 1000
max_us = 2000
step_us = 100
period_ms = 20

[encoder]
max_steps = 5
debounce_polls = 2

[button]
hold_ms = 800

[ramp]
dwell_ms = 250

[runner]
poll_hz = 500

[logging]
level = "debug"
rotation = "daily"

[telemetry]
file = "telemetry.log"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.encoder.debounce_polls, 2);
    assert_eq!(cfg.telemetry.file.as_deref(), Some("telemetry.log"));
}

#[rstest]
fn load_file_reports_path_on_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("knob.toml");
    fs::write(&path, "[pins\n").unwrap();
    let err = load_file(&path).expect_err("broken TOML");
    assert!(format!("{err}").contains("parse config"));
}

#[rstest]
fn load_file_validates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("knob.toml");
    fs::write(&path, with_pins("[runner]\npoll_hz = 0")).unwrap();
    let err = load_file(&path).expect_err("invalid config");
    assert!(format!("{err}").contains("poll_hz"));
}
