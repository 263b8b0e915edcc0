use std::{fs::File, path::Path, sync::Mutex};

use anyhow::Context as _;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_DIRECTIVES: &str = "wallyfit=info,wallyfit_engine=info,wallyfit_assist=info";

/// Logs to stderr.
pub(crate) fn init_stderr() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to initialize logging")
}

/// Logs to a file, leaving the terminal to the UI.
pub(crate) fn init_file(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("Failed to initialize logging")
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_DIRECTIVES.into())
}
