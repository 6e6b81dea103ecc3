//! Settings persistence
//!
//! Settings live in `<config dir>/Screengrab/settings.json`. A missing file
//! means defaults; a file that does not parse is an error so a typo is not
//! silently ignored. Unknown keys are dropped and missing keys take defaults.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config;
use crate::settings::{BackendKind, CaptureSettings};

pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(config::logging::APP_DIR_NAME))
}

pub fn settings_path(dir: &Path) -> PathBuf {
    dir.join(SETTINGS_FILE_NAME)
}

/// Rewrite legacy or foreign spellings so serde accepts them.
pub fn sanitize_settings_json(value: &mut Value) {
    let Value::Object(obj) = value else {
        return;
    };

    // Older files used "capture_method": "Wgc" | "GdiCopy"
    if let Some(method) = obj.remove("capture_method") {
        if !obj.contains_key("backend") {
            if let Some(kind) = method.as_str().and_then(|m| m.parse::<BackendKind>().ok()) {
                obj.insert("backend".to_string(), Value::String(kind.to_string()));
            }
        }
    }

    // Backend names are case-insensitive on disk
    if let Some(backend) = obj.get("backend").and_then(|v| v.as_str()) {
        match backend.parse::<BackendKind>() {
            Ok(kind) => {
                obj.insert("backend".to_string(), Value::String(kind.to_string()));
            }
            Err(_) => {
                log::warn!("Ignoring unknown backend {:?} in settings", backend);
                obj.remove("backend");
            }
        }
    }
}

pub fn load_settings(dir: &Path) -> Result<CaptureSettings> {
    let path = settings_path(dir);
    if !path.exists() {
        return Ok(CaptureSettings::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read settings file: {:?}", path))?;
    let mut value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Settings file is not valid JSON: {:?}", path))?;
    sanitize_settings_json(&mut value);

    serde_json::from_value(value).with_context(|| format!("Invalid settings in {:?}", path))
}

pub fn save_settings(dir: &Path, settings: &CaptureSettings) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
    }
    let path = settings_path(dir);
    let data = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
    fs::write(&path, data).with_context(|| format!("Failed to write settings file: {:?}", path))
}

/// Load from the default location, falling back to defaults if there is none.
pub fn load_default_settings() -> Result<CaptureSettings> {
    match config_dir() {
        Some(dir) => load_settings(&dir),
        None => Ok(CaptureSettings::default()),
    }
}

/// Apply `SCREENGRAB_BACKEND` / `SCREENGRAB_LOG` on top of loaded settings.
pub fn apply_env_overrides(settings: &mut CaptureSettings) {
    apply_overrides(
        settings,
        std::env::var(config::env::BACKEND).ok().as_deref(),
        std::env::var(config::env::LOG_LEVEL).ok().as_deref(),
    );
}

fn apply_overrides(settings: &mut CaptureSettings, backend: Option<&str>, log_level: Option<&str>) {
    if let Some(raw) = backend {
        match raw.parse::<BackendKind>() {
            Ok(kind) => settings.backend = kind,
            Err(e) => log::warn!("{}: {}", config::env::BACKEND, e),
        }
    }
    if let Some(level) = log_level {
        if !level.trim().is_empty() {
            settings.log_level = level.trim().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_capture_method_maps_to_backend() {
        let mut value = json!({"capture_method": "GdiCopy"});
        sanitize_settings_json(&mut value);
        assert_eq!(value, json!({"backend": "gdi"}));
    }

    #[test]
    fn explicit_backend_wins_over_legacy_key() {
        let mut value = json!({"capture_method": "GdiCopy", "backend": "WGC"});
        sanitize_settings_json(&mut value);
        assert_eq!(value, json!({"backend": "wgc"}));
    }

    #[test]
    fn unknown_backend_is_dropped() {
        let mut value = json!({"backend": "dxgi", "dpi_scaling": false});
        sanitize_settings_json(&mut value);
        assert_eq!(value, json!({"dpi_scaling": false}));
    }

    #[test]
    fn overrides_replace_backend_and_level() {
        let mut settings = CaptureSettings::default();
        apply_overrides(&mut settings, Some("auto"), Some("debug"));
        assert_eq!(settings.backend, BackendKind::Auto);
        assert_eq!(settings.log_level, "debug");

        apply_overrides(&mut settings, Some("nope"), Some("  "));
        assert_eq!(settings.backend, BackendKind::Auto);
        assert_eq!(settings.log_level, "debug");
    }
}
