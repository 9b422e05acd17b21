//! Human-readable error descriptions and structured JSON error formatting.

use knob_core::error::{BuildError, KnobError};
use knob_hardware::error::HwError;
use serde_json::json;

use crate::cli::ConfigContext;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ctx) = err.downcast_ref::<ConfigContext>() {
        let cause = err
            .chain()
            .nth(1)
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        return format!(
            "What happened: The config file {} could not be used ({cause}).\nLikely causes: Missing [pins] section, a typo in a key, or out-of-range ESC/encoder values.\nHow to fix: Edit the TOML (see etc/knob_config.toml), then rerun. `knob_cli print-config` shows the defaults.",
            ctx.path.display()
        );
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingEncoder => {
                "What happened: No encoder pins were provided to the controller.\nLikely causes: The CLK/DT inputs failed to open or were not wired into the builder.\nHow to fix: Pass both pins via with_encoder(clk, dt).".to_string()
            }
            BuildError::MissingButton => {
                "What happened: No push-button pin was provided to the controller.\nLikely causes: The SW input failed to open or was not wired into the builder.\nHow to fix: Pass the pin via with_button(sw).".to_string()
            }
            BuildError::MissingEsc => {
                "What happened: No ESC output was provided to the controller.\nLikely causes: The PWM channel failed to open or was not wired into the builder.\nHow to fix: Pass the output via with_esc(esc).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: ESC pulse widths, step size or encoder range that do not fit together.\nHow to fix: Edit the [esc] and [encoder] sections, then rerun."
            ),
        };
    }

    if let Some(hw) = err.downcast_ref::<HwError>() {
        return match hw {
            HwError::Script(msg) => format!(
                "What happened: The simulation script was rejected ({msg}).\nLikely causes: An unknown action or a missing count.\nHow to fix: Use comma-separated actions such as \"cw:3,wait:10,hold:1200\"."
            ),
            HwError::Gpio(_) | HwError::Io(_) => format!(
                "What happened: Failed to open the encoder pins ({hw}).\nLikely causes: Incorrect BCM numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values; ensure the process may access /dev/gpiomem."
            ),
            HwError::Pwm(_) | HwError::PulseOutOfRange { .. } => format!(
                "What happened: The ESC output failed ({hw}).\nLikely causes: PWM overlay not enabled, wrong channel, or a pulse outside the ESC range.\nHow to fix: Enable the pwm overlay, check pins.esc_pwm_channel and the [esc] limits."
            ),
        };
    }

    if let Some(ke) = err.downcast_ref::<KnobError>() {
        return match ke {
            KnobError::Hardware(_) | KnobError::HardwareFault(_) => format!(
                "What happened: An I/O error stopped the controller ({ke}).\nLikely causes: Loose wiring, a disconnected ESC, or a lost GPIO line.\nHow to fix: Check the wiring and power, then restart. The ESC was sent neutral where possible."
            ),
            KnobError::State(_) => format!(
                "What happened: {ke}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.chain().nth(1) {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 for config problems, 4 for I/O faults, 1 otherwise.
/// Usage errors exit with 2 through clap before any of this runs.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<ConfigContext>().is_some()
        || matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(_))
        )
    {
        return 3;
    }
    if let Some(hw) = err.downcast_ref::<HwError>() {
        return if matches!(hw, HwError::Script(_)) { 1 } else { 4 };
    }
    if matches!(
        err.downcast_ref::<KnobError>(),
        Some(KnobError::Hardware(_) | KnobError::HardwareFault(_))
    ) {
        return 4;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<ConfigContext>().is_some() {
        return "InvalidConfig";
    }
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(_) => "InvalidConfig",
            _ => "Build",
        };
    }
    if let Some(hw) = err.downcast_ref::<HwError>() {
        return match hw {
            HwError::Script(_) => "SimScript",
            _ => "Hardware",
        };
    }
    match err.downcast_ref::<KnobError>() {
        Some(KnobError::Hardware(_) | KnobError::HardwareFault(_)) => "Hardware",
        Some(KnobError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
