use crate::config::{ensure_parent, log_file_path, Config};
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to the log file; the terminal belongs to the UI.
    File,
    Stderr,
}

/// The config level, raised by each `-v`.
pub fn filter_directive(config_level: &str, verbose: u8) -> String {
    match verbose {
        0 => config_level.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over [`filter_directive`].
pub fn init(config: &Config, verbose: u8, target: LogTarget) -> Result<()> {
    let directive = filter_directive(&config.log.level, verbose);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false);

    let installed = match target {
        LogTarget::File => {
            let path = log_file_path(config)?;
            ensure_parent(&path)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening log file {:?}", path))?;
            builder.with_writer(Mutex::new(file)).try_init()
        }
        LogTarget::Stderr => builder.with_writer(io::stderr).try_init(),
    };
    if let Err(err) = installed {
        // Only happens when a subscriber is already set, e.g. under tests.
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
    Ok(())
}
