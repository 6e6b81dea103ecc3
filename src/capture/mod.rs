// capture/mod.rs - Capture façade
//
// `ScreenCapturer` is the capability every backend implements. `Capturer`
// wraps whichever backend `open` picked for the current settings.

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(target_os = "windows"))]
pub mod unsupported;

use log::{info, warn};

use crate::error::Result;
use crate::geometry::Rectangle;
use crate::pixels::PixelBuffer;
pub use crate::settings::BackendKind;
use crate::settings::CaptureSettings;

/// Region and display capture over one backend
pub trait ScreenCapturer {
    /// Capture `width` x `height` pixels at (`x`, `y`) in virtual-desktop
    /// coordinates.
    ///
    /// With `dpi_scaling` on, the arguments are logical coordinates and the
    /// buffer has the DPI-scaled size. Otherwise it is exactly
    /// `width` x `height`.
    fn capture(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<PixelBuffer>;

    /// Capture physical pixels, never DPI-scaled. The buffer is exactly
    /// `width` x `height`.
    fn capture_physical(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<PixelBuffer>;

    fn display_bounds(&self, index: i64) -> Result<Rectangle>;

    fn all_display_bounds(&self) -> Result<Vec<Rectangle>>;

    /// 0 when the displays cannot be counted
    fn num_active_displays(&self) -> usize;

    fn backend(&self) -> BackendKind;

    /// Capture a rectangle in the same physical space as the display bounds.
    fn capture_rect(&mut self, rect: &Rectangle) -> Result<PixelBuffer> {
        self.capture_physical(
            rect.left,
            rect.top,
            rect.right.saturating_sub(rect.left),
            rect.bottom.saturating_sub(rect.top),
        )
    }

    fn capture_display(&mut self, index: i64) -> Result<PixelBuffer> {
        let bounds = self.display_bounds(index)?;
        self.capture_rect(&bounds)
    }

    /// Capture the bounding box of every display.
    fn capture_all(&mut self) -> Result<PixelBuffer> {
        let bounds = Rectangle::bounding(&self.all_display_bounds()?);
        self.capture_rect(&bounds)
    }
}

/// The backend chosen by `open`
pub enum Capturer {
    #[cfg(target_os = "windows")]
    Gdi(windows::GdiCapturer),
    #[cfg(target_os = "windows")]
    Wgc(Box<windows::WgcCapturer>),
    #[cfg(not(target_os = "windows"))]
    Unsupported(unsupported::UnsupportedCapturer),
}

impl std::fmt::Debug for Capturer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Capturer").field(&self.backend()).finish()
    }
}

/// Whether the compositor capture API (WGC) is usable on this system.
pub fn is_compositor_capture_supported() -> bool {
    #[cfg(target_os = "windows")]
    {
        windows::wgc::is_supported()
    }

    #[cfg(not(target_os = "windows"))]
    {
        false
    }
}

/// Build the capturer selected by `settings.backend`.
///
/// `Auto` prefers WGC and falls back to GDI when WGC is unavailable or fails
/// to start. An explicit `Wgc` request fails instead of falling back.
pub fn open(settings: &CaptureSettings) -> Result<Capturer> {
    #[cfg(target_os = "windows")]
    {
        let capturer = match settings.backend {
            BackendKind::Gdi => Capturer::Gdi(windows::GdiCapturer::new(settings)),
            BackendKind::Wgc => Capturer::Wgc(Box::new(windows::WgcCapturer::open(settings)?)),
            BackendKind::Auto => match windows::WgcCapturer::open(settings) {
                Ok(wgc) => Capturer::Wgc(Box::new(wgc)),
                Err(e) => {
                    warn!("WGC unavailable ({}), falling back to GDI", e);
                    Capturer::Gdi(windows::GdiCapturer::new(settings))
                }
            },
        };
        info!("Opened {} capture backend", capturer.backend());
        Ok(capturer)
    }

    #[cfg(not(target_os = "windows"))]
    {
        if settings.backend == BackendKind::Wgc {
            warn!("WGC requested on {}", std::env::consts::OS);
        }
        let capturer = Capturer::Unsupported(unsupported::UnsupportedCapturer::new(settings.backend));
        info!("Opened placeholder capturer");
        Ok(capturer)
    }
}

impl Capturer {
    fn inner(&self) -> &dyn ScreenCapturer {
        match self {
            #[cfg(target_os = "windows")]
            Capturer::Gdi(c) => c,
            #[cfg(target_os = "windows")]
            Capturer::Wgc(c) => c.as_ref(),
            #[cfg(not(target_os = "windows"))]
            Capturer::Unsupported(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ScreenCapturer {
        match self {
            #[cfg(target_os = "windows")]
            Capturer::Gdi(c) => c,
            #[cfg(target_os = "windows")]
            Capturer::Wgc(c) => c.as_mut(),
            #[cfg(not(target_os = "windows"))]
            Capturer::Unsupported(c) => c,
        }
    }

    /// Drop cached monitor lists and DPI values, e.g. after a display change.
    pub fn invalidate_caches(&self) {
        match self {
            #[cfg(target_os = "windows")]
            Capturer::Gdi(c) => c.invalidate_caches(),
            #[cfg(target_os = "windows")]
            Capturer::Wgc(c) => c.invalidate_caches(),
            #[cfg(not(target_os = "windows"))]
            Capturer::Unsupported(_) => {}
        }
    }

    /// Release backend resources. Only WGC holds any between calls.
    pub fn close(&mut self) {
        match self {
            #[cfg(target_os = "windows")]
            Capturer::Wgc(c) => c.close(),
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }
}

impl Capturer {
    fn log_failure(&self, region: Rectangle, result: &Result<PixelBuffer>) {
        if let Err(e) = result {
            if e.is_platform_failure() {
                warn!("{} capture of {} failed: {}", self.backend(), region, e);
            }
        }
    }
}

impl ScreenCapturer for Capturer {
    fn capture(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<PixelBuffer> {
        let result = self.inner_mut().capture(x, y, width, height);
        self.log_failure(Rectangle::from_xywh(x, y, width, height), &result);
        result
    }

    fn capture_physical(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<PixelBuffer> {
        let result = self.inner_mut().capture_physical(x, y, width, height);
        self.log_failure(Rectangle::from_xywh(x, y, width, height), &result);
        result
    }

    fn display_bounds(&self, index: i64) -> Result<Rectangle> {
        self.inner().display_bounds(index)
    }

    fn all_display_bounds(&self) -> Result<Vec<Rectangle>> {
        self.inner().all_display_bounds()
    }

    fn num_active_displays(&self) -> usize {
        self.inner().num_active_displays()
    }

    fn backend(&self) -> BackendKind {
        self.inner().backend()
    }
}
