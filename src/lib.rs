//! Screengrab - Screen Capture Library
//!
//! One-shot capture of desktop regions and individual displays into owned
//! RGBA buffers. On Windows two backends are available: GDI `BitBlt` from the
//! desktop device context, and a Windows.Graphics.Capture frame pool. Other
//! platforms get a capturer that reports `UnsupportedPlatform` for everything.
//!
//! ```no_run
//! use screengrab::{capture, CaptureSettings, ScreenCapturer};
//!
//! let mut capturer = capture::open(&CaptureSettings::default())?;
//! let image = capturer.capture_display(0)?;
//! println!("{}x{}", image.width(), image.height());
//! # Ok::<(), screengrab::CaptureError>(())
//! ```

// Configuration constants
pub mod config;

pub mod error;
pub mod geometry;
pub mod pixels;

// DPI scaling and monitor enumeration
pub mod dpi;
pub mod monitors;

pub mod capture;

// Settings and logging
pub mod logging;
pub mod settings;
pub mod settings_io;

// Re-export commonly used types
pub use capture::{is_compositor_capture_supported, open, Capturer, ScreenCapturer};
pub use dpi::scale_for_dpi;
pub use error::{CaptureError, Result};
pub use geometry::Rectangle;
pub use monitors::{MonitorEnumerator, MonitorProbe};
pub use pixels::PixelBuffer;
pub use settings::{BackendKind, CaptureSettings};

#[cfg(target_os = "windows")]
pub use capture::windows::{GdiCapturer, WgcCapturer, Win32MonitorProbe};
