// capture/windows/gdi.rs - GDI BitBlt capture
//
// Copies a desktop region into a top-down 32-bit DIB section and converts it
// to RGBA. Every GDI handle lives in a guard, so handles are released in
// reverse order of acquisition on every exit path.

use std::ffi::c_void;
use std::mem::size_of;

use log::{debug, trace};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, GdiFlush, SelectObject,
    BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBITMAP, HDC, HGDIOBJ, SRCCOPY,
};

use super::display::{WindowDc, Win32MonitorProbe};
use crate::capture::{BackendKind, ScreenCapturer};
use crate::config::pixels::{BITS_PER_PIXEL, BYTES_PER_PIXEL};
use crate::dpi::{scale_for_dpi, DpiCache};
use crate::error::{CaptureError, Result};
use crate::geometry::Rectangle;
use crate::monitors::MonitorEnumerator;
use crate::pixels::PixelBuffer;
use crate::settings::CaptureSettings;

/// Memory DC compatible with the desktop
struct MemoryDc(HDC);

impl MemoryDc {
    fn compatible_with(screen: &WindowDc) -> Result<Self> {
        let hdc = unsafe { CreateCompatibleDC(Some(screen.hdc())) };
        if hdc.is_invalid() {
            return Err(CaptureError::Allocation("CreateCompatibleDC failed".into()));
        }
        Ok(Self(hdc))
    }
}

impl Drop for MemoryDc {
    fn drop(&mut self) {
        unsafe {
            let _ = DeleteDC(self.0);
        }
    }
}

/// Top-down 32 bpp DIB section and its pixel memory
struct DibSection {
    bitmap: HBITMAP,
    bits: *mut c_void,
    len: usize,
}

impl DibSection {
    fn new(mem_dc: &MemoryDc, width: i32, height: i32) -> Result<Self> {
        let bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height: first row in memory is the top of the image
                biHeight: -height,
                biPlanes: 1,
                biBitCount: BITS_PER_PIXEL,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut bits: *mut c_void = std::ptr::null_mut();
        let bitmap = unsafe {
            CreateDIBSection(Some(mem_dc.0), &bmi, DIB_RGB_COLORS, &mut bits, None, 0)
        }
        .map_err(|e| CaptureError::Allocation(format!("CreateDIBSection failed: {}", e)))?;

        let section = Self {
            bitmap,
            bits,
            len: width as usize * height as usize * BYTES_PER_PIXEL,
        };
        if section.bits.is_null() {
            return Err(CaptureError::Allocation(
                "CreateDIBSection returned no pixel memory".into(),
            ));
        }
        Ok(section)
    }

    /// Pixel memory. Only valid while the section is alive.
    fn bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.bits as *const u8, self.len) }
    }
}

impl Drop for DibSection {
    fn drop(&mut self) {
        unsafe {
            let _ = DeleteObject(self.bitmap.into());
        }
    }
}

/// Bitmap selected into a memory DC; the previous object is restored on drop
struct Selection {
    hdc: HDC,
    previous: HGDIOBJ,
}

impl Selection {
    fn select(mem_dc: &MemoryDc, dib: &DibSection) -> Result<Self> {
        let previous = unsafe { SelectObject(mem_dc.0, dib.bitmap.into()) };
        if previous.is_invalid() {
            return Err(CaptureError::Allocation(
                "SelectObject failed for capture bitmap".into(),
            ));
        }
        Ok(Self {
            hdc: mem_dc.0,
            previous,
        })
    }
}

impl Drop for Selection {
    fn drop(&mut self) {
        unsafe {
            SelectObject(self.hdc, self.previous);
        }
    }
}

/// Screen capture through the desktop device context
pub struct GdiCapturer {
    monitors: MonitorEnumerator<Win32MonitorProbe>,
    dpi_cache: DpiCache<isize>,
    dpi_scaling: bool,
    parallel_convert: bool,
}

impl GdiCapturer {
    pub fn new(settings: &CaptureSettings) -> Self {
        debug!(
            "Creating GdiCapturer (dpi_scaling={}, real_resolution={}, cache_monitors={})",
            settings.dpi_scaling, settings.real_resolution, settings.cache_monitors
        );
        Self {
            monitors: MonitorEnumerator::new(
                Win32MonitorProbe::new(settings.real_resolution),
                settings.cache_monitors,
            ),
            dpi_cache: DpiCache::new(),
            dpi_scaling: settings.dpi_scaling,
            parallel_convert: settings.parallel_convert,
        }
    }

    fn resolve_dpi(&self, screen: &WindowDc, logical: bool) -> u32 {
        if !logical || !self.dpi_scaling {
            return crate::config::dpi::BASELINE_DPI;
        }
        self.dpi_cache
            .get_or_insert_with(screen.cache_key(), || screen.dpi())
    }

    /// Forget cached monitors and DPI values.
    pub fn invalidate_caches(&self) {
        self.monitors.invalidate();
        self.dpi_cache.invalidate();
    }

    pub fn monitors(&self) -> &MonitorEnumerator<Win32MonitorProbe> {
        &self.monitors
    }

    /// Capture a region of the virtual desktop. `logical` coordinates are
    /// DPI-scaled when scaling is enabled.
    ///
    /// Parts of the region outside every monitor come back black.
    pub fn grab(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        logical: bool,
    ) -> Result<PixelBuffer> {
        if width <= 0 || height <= 0 {
            return Err(CaptureError::dimension(width, height));
        }

        let screen = WindowDc::desktop()?;
        let dpi = self.resolve_dpi(&screen, logical);
        let (src_x, src_y) = (scale_for_dpi(x, dpi), scale_for_dpi(y, dpi));
        let (w, h) = (scale_for_dpi(width, dpi), scale_for_dpi(height, dpi));
        if w <= 0 || h <= 0 {
            return Err(CaptureError::dimension(w, h));
        }
        trace!(
            "GDI capture {} at {} DPI -> {}x{} from ({}, {})",
            Rectangle::from_xywh(x, y, width, height),
            dpi,
            w,
            h,
            src_x,
            src_y
        );

        let mem_dc = MemoryDc::compatible_with(&screen)?;
        let dib = DibSection::new(&mem_dc, w, h)?;
        let _selection = Selection::select(&mem_dc, &dib)?;

        unsafe { BitBlt(mem_dc.0, 0, 0, w, h, Some(screen.hdc()), src_x, src_y, SRCCOPY) }
            .map_err(|e| CaptureError::Blit(format!("BitBlt failed: {}", e)))?;
        unsafe {
            let _ = GdiFlush();
        }

        PixelBuffer::from_bgra(w as u32, h as u32, dib.bytes(), self.parallel_convert)
    }
}

impl ScreenCapturer for GdiCapturer {
    fn capture(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<PixelBuffer> {
        self.grab(x, y, width, height, true)
    }

    fn capture_physical(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<PixelBuffer> {
        self.grab(x, y, width, height, false)
    }

    fn display_bounds(&self, index: i64) -> Result<Rectangle> {
        self.monitors.bounds(index)
    }

    fn all_display_bounds(&self) -> Result<Vec<Rectangle>> {
        self.monitors.all_bounds()
    }

    fn num_active_displays(&self) -> usize {
        self.monitors.count()
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Gdi
    }
}
