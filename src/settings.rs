use serde::{Deserialize, Serialize};

use crate::config;

/// Which capture implementation `capture::open` builds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GDI BitBlt from the desktop DC (broad compatibility)
    #[default]
    Gdi,
    /// Windows.Graphics.Capture frame pool (Windows 10 1803+)
    Wgc,
    /// WGC when the OS supports it, GDI otherwise
    Auto,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Gdi => write!(f, "gdi"),
            BackendKind::Wgc => write!(f, "wgc"),
            BackendKind::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gdi" | "gdicopy" | "bitblt" => Ok(BackendKind::Gdi),
            "wgc" | "graphics-capture" => Ok(BackendKind::Wgc),
            "auto" => Ok(BackendKind::Auto),
            other => Err(format!("Invalid capture backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureSettings {
    // Backend
    #[serde(default)]
    pub backend: BackendKind,

    // Coordinates
    /// Treat `capture` coordinates as logical and scale them by the desktop DPI.
    /// Off by default, so captures come back at the requested size.
    #[serde(default)]
    pub dpi_scaling: bool,
    /// Report monitor bounds at the current display mode instead of the DPI-virtualized rect
    #[serde(default = "default_true")]
    pub real_resolution: bool,
    /// Keep the first successful monitor enumeration until invalidated
    #[serde(default = "default_true")]
    pub cache_monitors: bool,

    // Performance
    #[serde(default = "default_true")]
    pub parallel_convert: bool,

    // WGC only
    #[serde(default)]
    pub show_cursor: bool,

    // Logging
    #[serde(default = "default_log_level")]
    pub log_level: String, // "Off", "Error", "Warn", "Info", "Debug", "Trace"
    #[serde(default)]
    pub log_to_file: bool,
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,
}

// Default functions for serde
fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "Warn".to_string()
}

fn default_log_retention_days() -> u32 {
    config::logging::LOG_RETENTION_DAYS
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            dpi_scaling: false,
            real_resolution: true,
            cache_monitors: true,
            parallel_convert: true,
            show_cursor: false,
            log_level: default_log_level(),
            log_to_file: false,
            log_retention_days: default_log_retention_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let parsed: CaptureSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, CaptureSettings::default());
    }

    #[test]
    fn dpi_scaling_is_opt_in() {
        assert!(!CaptureSettings::default().dpi_scaling);
        let parsed: CaptureSettings = serde_json::from_str(r#"{"dpi_scaling": true}"#).unwrap();
        assert!(parsed.dpi_scaling);
    }

    #[test]
    fn backend_serializes_lowercase() {
        let json = serde_json::to_string(&BackendKind::Wgc).unwrap();
        assert_eq!(json, "\"wgc\"");
        assert_eq!("AUTO".parse::<BackendKind>(), Ok(BackendKind::Auto));
        assert!("dxgi".parse::<BackendKind>().is_err());
    }
}
