//! Logging setup for screengrab
//!
//! Library code logs through the `log` macros. `init_logging` installs a
//! tracing subscriber that also captures those records, with:
//! - Configurable log levels (Off, Error, Warn, Info, Debug, Trace)
//! - A reloadable filter, so calling `init_logging` again only changes the level
//! - Optional daily rotated log files in the platform log directory

use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::logging::{APP_DIR_NAME, LOG_FILE_NAME};
use crate::settings::CaptureSettings;

lazy_static! {
    static ref LOG_RELOAD_HANDLE: Mutex<Option<Handle<EnvFilter, Registry>>> = Mutex::new(None);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Off,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Off => "Off",
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("warning") {
            return Ok(LogLevel::Warn);
        }
        LogLevel::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Invalid log level: {}", s))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Filter directive for a level: our crate only, everything else stays quiet.
pub fn filter_directive(log_level: LogLevel) -> String {
    match log_level {
        LogLevel::Off => "off".to_string(),
        level => format!("screengrab={}", level.name().to_lowercase()),
    }
}

/// Platform log directory, created on first use
pub fn get_logs_dir() -> Result<PathBuf> {
    let logs_dir = if cfg!(target_os = "macos") {
        // macOS: ~/Library/Logs/Screengrab
        dirs::home_dir()
            .context("Failed to get home directory")?
            .join("Library")
            .join("Logs")
            .join(APP_DIR_NAME)
    } else {
        // Windows: %LOCALAPPDATA%\Screengrab\logs
        // Linux: ~/.local/share/Screengrab/logs
        dirs::data_local_dir()
            .context("Failed to get local data directory")?
            .join(APP_DIR_NAME)
            .join("logs")
    };

    if !logs_dir.exists() {
        fs::create_dir_all(&logs_dir)
            .with_context(|| format!("Failed to create logs directory: {:?}", logs_dir))?;
    }

    Ok(logs_dir)
}

/// Initialize logging, or change the level if it is already initialized.
///
/// File logging is decided on the first call only.
pub fn init_logging(log_level: LogLevel, log_to_file: bool) -> Result<()> {
    let level_filter = EnvFilter::new(filter_directive(log_level));

    let mut handle_guard = LOG_RELOAD_HANDLE
        .lock()
        .map_err(|_| anyhow!("Log reload handle lock poisoned"))?;
    if let Some(handle) = handle_guard.as_ref() {
        handle
            .reload(level_filter)
            .context("Failed to reload log filter")?;
        return Ok(());
    }

    let (filter_layer, reload_handle) = tracing_subscriber::reload::Layer::new(level_filter);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if log_to_file {
        let logs_dir = get_logs_dir()?;
        let appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, LOG_FILE_NAME);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(appender)
            .with_target(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .with(file_layer)
            .try_init()
            .context("Failed to install log subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init()
            .context("Failed to install log subscriber")?;
    }

    *handle_guard = Some(reload_handle);
    tracing::debug!(level = %log_level.as_filter(), log_to_file, "Logging initialized");
    Ok(())
}

/// `init_logging` driven by settings. An unknown level falls back to Warn.
pub fn init_from_settings(settings: &CaptureSettings) -> Result<()> {
    let level = settings.log_level.parse::<LogLevel>().unwrap_or_else(|e| {
        eprintln!("{}, using Warn", e);
        LogLevel::Warn
    });
    init_logging(level, settings.log_to_file)?;
    if settings.log_to_file {
        auto_cleanup_old_logs(settings.log_retention_days);
    }
    Ok(())
}

/// Delete rotated log files older than `keep_days`. Returns how many were removed.
pub fn cleanup_old_logs(logs_dir: &Path, keep_days: u32) -> Result<usize> {
    let max_age = Duration::from_secs(u64::from(keep_days) * 24 * 60 * 60);
    let now = SystemTime::now();

    let entries = fs::read_dir(logs_dir)
        .with_context(|| format!("Failed to read logs directory: {:?}", logs_dir))?;

    let mut deleted = 0;
    for path in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
        // Daily rotation names files screengrab.log.YYYY-MM-DD
        let is_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_NAME) || name.ends_with(".log"));
        if !is_log || !path.is_file() {
            continue;
        }

        let age = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if let Some(age) = age.filter(|age| *age > max_age) {
            if fs::remove_file(&path).is_ok() {
                deleted += 1;
                tracing::debug!(file = ?path, age_days = age.as_secs() / 86400, "Deleted old log file");
            }
        }
    }

    Ok(deleted)
}

/// Cleanup on a background thread
pub fn auto_cleanup_old_logs(keep_days: u32) {
    std::thread::spawn(move || {
        if let Ok(logs_dir) = get_logs_dir() {
            match cleanup_old_logs(&logs_dir, keep_days) {
                Ok(count) if count > 0 => {
                    tracing::info!(deleted_count = count, "Cleaned up old log files");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to cleanup old log files");
                }
                _ => {}
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_targets_this_crate() {
        assert_eq!(filter_directive(LogLevel::Debug), "screengrab=debug");
        assert_eq!(filter_directive(LogLevel::Off), "off");
    }

    #[test]
    fn level_round_trips_through_display() {
        for level in [LogLevel::Error, LogLevel::Warn, LogLevel::Trace] {
            assert_eq!(level.to_string().parse::<LogLevel>(), Ok(level));
        }
    }
}
