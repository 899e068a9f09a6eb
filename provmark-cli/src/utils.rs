//! Common utility functions shared across CLI commands.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use provmark_core::config::parse_strength;
use provmark_core::Config;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::WorkspaceArgs;

/// Install the subscriber: a terse stderr layer (`RUST_LOG` wins over
/// `--verbose`) plus a debug trace appended to `debug_log.log` in the log
/// directory.
pub fn init_tracing(verbose: bool, config: &Config) -> Result<()> {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let path = config.debug_log_path();
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to write debug log: {}", path.display()))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to write debug log: {}", path.display()))?;

    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);
    let trace = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_filter(
            Targets::new()
                .with_target("provmark_core", LevelFilter::DEBUG)
                .with_target("provmark", LevelFilter::DEBUG),
        );

    tracing_subscriber::registry()
        .with(stderr)
        .with(trace)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

/// Environment configuration with the command line overrides applied.
pub fn resolve_config(workspace: &WorkspaceArgs, hash: Option<&str>) -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    apply_overrides(config, workspace, hash)
}

fn apply_overrides(
    mut config: Config,
    workspace: &WorkspaceArgs,
    hash: Option<&str>,
) -> Result<Config> {
    if let Some(dir) = &workspace.originals {
        config.originals_dir = dir.clone();
    }
    if let Some(dir) = &workspace.watermarked {
        config.watermarked_dir = dir.clone();
    }
    if let Some(dir) = &workspace.log_dir {
        config.log_dir = dir.clone();
    }
    if let Some(strength) = &workspace.strength {
        config.watermark.strength = parse_strength(strength)?;
    }
    if let Some(algorithm) = hash {
        config.hash_algorithm = algorithm.parse()?;
    }
    Ok(config)
}

/// Record the effective configuration once the subscriber is up.
pub fn log_config(config: &Config) {
    debug!(
        originals = %config.originals_dir.display(),
        watermarked = %config.watermarked_dir.display(),
        logs = %config.log_dir.display(),
        strength = config.watermark.strength,
        hash = config.hash_algorithm.name(),
        "Resolved configuration"
    );
}

/// Fail early when a batch input folder is missing.
pub fn require_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("Failed to read folder: {} does not exist", dir.display());
    }
    Ok(())
}
