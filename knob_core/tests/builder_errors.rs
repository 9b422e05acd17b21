use knob_core::error::BuildError;
use knob_core::mocks::{RecordingEsc, SharedPin};
use knob_core::{EncoderCfg, EscCfg, Knob, KnobCfg, build_knob};
use rstest::rstest;

fn pin() -> SharedPin {
    SharedPin::new(true)
}

#[rstest]
fn missing_encoder_yields_typed_build_error() {
    let err = Knob::builder()
        .with_button(pin())
        .with_esc(RecordingEsc::new())
        .try_build()
        .expect_err("should fail with MissingEncoder");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingEncoder) => {}
        other => panic!("expected MissingEncoder, got: {other:?}"),
    }
}

#[rstest]
fn missing_button_yields_typed_build_error() {
    let err = Knob::builder()
        .with_encoder(pin(), pin())
        .with_esc(RecordingEsc::new())
        .try_build()
        .expect_err("should fail with MissingButton");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingButton)
    ));
}

#[rstest]
fn missing_esc_yields_typed_build_error() {
    let err = Knob::builder()
        .with_encoder(pin(), pin())
        .with_button(pin())
        .try_build()
        .expect_err("should fail with MissingEsc");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingEsc)
    ));
}

#[rstest]
#[case(EscCfg { min_us: 2000, max_us: 1000, ..EscCfg::default() }, "min_us")]
#[case(EscCfg { neutral_us: 2000, ..EscCfg::default() }, "strictly between")]
#[case(EscCfg { step_us: 0, ..EscCfg::default() }, "step_us")]
#[case(EscCfg { step_us: 30, ..EscCfg::default() }, "whole number of steps")]
#[case(EscCfg { step_us: 60, ..EscCfg::default() }, "whole number of steps")]
fn invalid_esc_config_is_rejected(#[case] esc: EscCfg, #[case] needle: &str) {
    let err = Knob::builder()
        .with_encoder(pin(), pin())
        .with_button(pin())
        .with_esc(RecordingEsc::new())
        .with_esc_cfg(esc)
        .build()
        .expect_err("invalid esc config");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => {
            assert!(msg.contains(needle), "'{msg}' does not mention '{needle}'");
        }
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[rstest]
#[case(0)]
#[case(11)]
fn max_steps_must_fit_the_esc_range(#[case] max_steps: u16) {
    let err = Knob::builder()
        .with_encoder(pin(), pin())
        .with_button(pin())
        .with_esc(RecordingEsc::new())
        .with_encoder_cfg(EncoderCfg {
            max_steps,
            debounce_polls: 0,
        })
        .build()
        .expect_err("max_steps out of range");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
fn generic_builder_shares_validation() {
    let cfg = KnobCfg {
        esc: EscCfg {
            step_us: 0,
            ..EscCfg::default()
        },
        ..KnobCfg::default()
    };
    let err = build_knob(pin(), pin(), pin(), RecordingEsc::new(), cfg, None, None)
        .expect_err("zero step");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));

    let knob = build_knob(
        pin(),
        pin(),
        pin(),
        RecordingEsc::new(),
        KnobCfg::default(),
        None,
        None,
    )
    .expect("defaults build");
    assert_eq!(knob.counter(), 0);
    assert!(!knob.is_armed());
}
