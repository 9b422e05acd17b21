mod cli;
mod error_fmt;
mod run;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use knob_config::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::cli::{Cli, Commands, ConfigContext, FILE_GUARD, JSON_MODE};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let code = match real_main(cli) {
        Ok(()) => 0,
        Err(err) => {
            let code = error_fmt::exit_code_for_error(&err);
            tracing::error!(exit_code = code, "{err:#}");
            if JSON_MODE.get().copied().unwrap_or(false) {
                println!("{}", error_fmt::format_error_json(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            code
        }
    };
    std::process::exit(code);
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let cfg = knob_config::load_file(&cli.config).wrap_err(ConfigContext {
        path: cli.config.clone(),
    })?;
    init_tracing(&cfg, cli.json, cli.log_level.as_deref())?;
    // Reports print through humanize; color-eyre only contributes panic/span hooks.
    color_eyre::install()?;

    match cli.cmd {
        Commands::Run {
            max_run_ms,
            sim_script,
            stats,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&shutdown);
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .wrap_err("install ctrl-c handler")?;
            let summary = run::run_loop(
                &cfg,
                cli.json,
                max_run_ms,
                sim_script.as_deref(),
                stats,
                shutdown,
            )?;
            tracing::info!(
                ticks = summary.ticks,
                ramps = summary.ramps,
                stop_reason = summary.stop_reason.as_str(),
                "run complete"
            );
            run::print_summary(&summary, cli.json);
        }
        Commands::Ramp => {
            let steps = run::ramp_once(&cfg, cli.json)?;
            tracing::info!(steps, "ramp complete");
        }
        Commands::SelfCheck => {
            let backend = run::self_check(&cfg)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "event": "self_check", "ok": true, "backend": backend })
                );
            } else {
                println!("Self-check OK ({backend} backend)");
            }
        }
        Commands::PrintConfig => print_config(&cfg, cli.json)?,
    }
    Ok(())
}

fn print_config(cfg: &Config, json: bool) -> eyre::Result<()> {
    if json {
        println!("{}", serde_json::to_string(cfg).wrap_err("serialize config")?);
    } else {
        print!("{}", toml::to_string_pretty(cfg).wrap_err("serialize config")?);
    }
    Ok(())
}

/// Console logs go to stderr so stdout stays a clean status/JSON stream.
/// `RUST_LOG` wins over `--log-level`, which wins over `[logging].level`.
fn init_tracing(cfg: &Config, json: bool, cli_level: Option<&str>) -> eyre::Result<()> {
    let level = cli_level
        .or(cfg.logging.level.as_deref())
        .unwrap_or("info")
        .to_string();
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter())
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter())
            .boxed()
    };

    let file = match cfg.logging.file.as_deref() {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name"))?;
            let appender = match cfg.logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(filter())
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("init tracing")?;
    Ok(())
}
