//! Logging setup
//!
//! Logs go to a file when one is configured, otherwise to stderr. While the
//! dashboard owns the terminal, stderr output is dropped so log lines don't
//! tear the frame.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

static SCREEN_OWNED: AtomicBool = AtomicBool::new(false);

/// Mute (or unmute) stderr logging while the alternate screen is active
pub fn set_screen_owned(owned: bool) {
    SCREEN_OWNED.store(owned, Ordering::SeqCst);
}

pub fn init(verbose: bool, level: Option<&str>, file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or(default_level)))
        .context("Invalid log filter")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let subscriber = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = builder
                .with_writer(|| -> Box<dyn Write> {
                    if SCREEN_OWNED.load(Ordering::SeqCst) {
                        Box::new(io::sink())
                    } else {
                        Box::new(io::stderr())
                    }
                })
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}
