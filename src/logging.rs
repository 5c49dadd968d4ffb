//! Diagnostic logging setup.
//!
//! Library code only emits `tracing` events; the binary decides where they
//! go. The full-screen ritual owns the terminal, so it logs nowhere unless
//! a file is given.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive, e.g. `qiuqian=debug`.
pub const LOG_FILTER_ENV: &str = "QIUQIAN_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
    Disabled,
}

impl LogTarget {
    /// Pick a destination: an explicit file always wins, otherwise stderr
    /// unless the terminal belongs to the UI.
    pub fn choose(debug_log: Option<&Path>, tui: bool) -> Self {
        match debug_log {
            Some(path) => LogTarget::File(path.to_path_buf()),
            None if tui => LogTarget::Disabled,
            None => LogTarget::Stderr,
        }
    }
}

fn make_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Safe to call more than once; later calls
/// leave the first subscriber in place.
pub fn init(target: &LogTarget) -> Result<(), Box<dyn std::error::Error>> {
    match target {
        LogTarget::Disabled => {}
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(make_filter())
                .with_target(true)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| format!("cannot open log file {}: {err}", path.display()))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(make_filter())
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
    }
    Ok(())
}
