//! Server log file.
//!
//! The log is truncated at every start so `/log/` only shows the current
//! run. `log` records from the whole crate are bridged into a
//! `tracing-subscriber` fmt layer writing to the file.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Env var holding the log filter, e.g. `RAILYARD_LOG=railyard=debug`.
pub const LOG_ENV: &str = "RAILYARD_LOG";

/// Largest tail of the log returned by [`read_tail`].
pub const MAX_LOG_VIEW: usize = 256 * 1024;

/// Truncate `path` and route all logging into it.
pub fn init(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("opening log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

/// The last [`MAX_LOG_VIEW`] bytes of the log, starting on a line boundary.
pub fn read_tail(path: &Path) -> io::Result<String> {
    let text = fs::read_to_string(path)?;
    if text.len() <= MAX_LOG_VIEW {
        return Ok(text);
    }
    let mut cut = text.len() - MAX_LOG_VIEW;
    while !text.is_char_boundary(cut) {
        cut += 1;
    }
    let tail = &text[cut..];
    let tail = tail.find('\n').map_or(tail, |nl| &tail[nl + 1..]);
    Ok(tail.to_string())
}
