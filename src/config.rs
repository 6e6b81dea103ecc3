//! Capture Configuration Constants
//!
//! Centralized configuration for the magic numbers used by the capture pipeline.

/// DPI scaling
pub mod dpi {
    /// Unscaled baseline (100%)
    pub const BASELINE_DPI: u32 = 96;

    /// Half of the baseline, added before dividing to round half up
    pub const ROUNDING_BIAS: i64 = (BASELINE_DPI / 2) as i64;
}

/// Pixel layout
pub mod pixels {
    /// Bytes per pixel for both the BGRA source and the RGBA output
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Bit depth requested for the capture bitmap
    pub const BITS_PER_PIXEL: u16 = 32;

    /// Screenshots are always treated as opaque
    pub const OPAQUE_ALPHA: u8 = 255;
}

/// BGRA -> RGBA conversion
pub mod convert {
    /// Buffers at least this large are converted on the rayon pool (1 MiB)
    pub const PARALLEL_THRESHOLD_BYTES: usize = 1 << 20;

    /// Work unit for parallel conversion; a multiple of 4 so no pixel is split
    pub const PARALLEL_CHUNK_BYTES: usize = 64 * 1024;
}

/// Windows.Graphics.Capture backend
pub mod wgc {
    /// Frames kept in flight by the frame pool
    pub const FRAME_POOL_BUFFERS: i32 = 2;

    /// How often to poll the frame pool while waiting for a frame
    pub const FRAME_POLL_INTERVAL_MS: u64 = 5;

    /// Give up waiting for a frame after this long
    pub const FRAME_WAIT_TIMEOUT_MS: u64 = 1_000;
}

/// Logging
pub mod logging {
    /// Folder name used under the platform log/config directories
    pub const APP_DIR_NAME: &str = "Screengrab";

    /// Daily rolling log file prefix
    pub const LOG_FILE_NAME: &str = "screengrab.log";

    /// Log retention period in days
    pub const LOG_RETENTION_DAYS: u32 = 14;
}

/// Environment overrides read by `settings_io::apply_env_overrides`
pub mod env {
    /// `gdi`, `wgc` or `auto`
    pub const BACKEND: &str = "SCREENGRAB_BACKEND";

    /// `off`, `error`, `warn`, `info`, `debug` or `trace`
    pub const LOG_LEVEL: &str = "SCREENGRAB_LOG";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_chunk_never_splits_a_pixel() {
        assert_eq!(convert::PARALLEL_CHUNK_BYTES % pixels::BYTES_PER_PIXEL, 0);
        assert!(convert::PARALLEL_THRESHOLD_BYTES >= convert::PARALLEL_CHUNK_BYTES);
    }

    #[test]
    fn rounding_bias_is_half_the_baseline() {
        assert_eq!(dpi::ROUNDING_BIAS * 2, dpi::BASELINE_DPI as i64);
    }
}
