//! Non-Windows stand-in: every operation reports `UnsupportedPlatform`.

use super::{BackendKind, ScreenCapturer};
use crate::error::{CaptureError, Result};
use crate::geometry::Rectangle;
use crate::pixels::PixelBuffer;

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedCapturer {
    requested: BackendKind,
}

impl UnsupportedCapturer {
    pub fn new(requested: BackendKind) -> Self {
        log::info!(
            "Screen capture unavailable on {} (requested backend: {})",
            std::env::consts::OS,
            requested
        );
        Self { requested }
    }

    fn error(&self) -> CaptureError {
        CaptureError::UnsupportedPlatform(format!(
            "{} capture needs Windows, running on {}",
            self.requested,
            std::env::consts::OS
        ))
    }
}

impl ScreenCapturer for UnsupportedCapturer {
    fn capture(&mut self, _x: i32, _y: i32, _width: i32, _height: i32) -> Result<PixelBuffer> {
        Err(self.error())
    }

    fn capture_physical(
        &mut self,
        _x: i32,
        _y: i32,
        _width: i32,
        _height: i32,
    ) -> Result<PixelBuffer> {
        Err(self.error())
    }

    fn display_bounds(&self, _index: i64) -> Result<Rectangle> {
        Err(self.error())
    }

    fn all_display_bounds(&self) -> Result<Vec<Rectangle>> {
        Err(self.error())
    }

    fn num_active_displays(&self) -> usize {
        0
    }

    fn backend(&self) -> BackendKind {
        self.requested
    }
}
