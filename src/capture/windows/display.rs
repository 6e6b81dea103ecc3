// capture/windows/display.rs - Win32 monitor enumeration and DPI queries

use std::mem;

use log::{debug, warn};
use windows::core::{BOOL, PCWSTR};
use windows::Win32::Foundation::{GetLastError, HWND, LPARAM, POINT, RECT};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, EnumDisplaySettingsW, GetDC, GetDeviceCaps, GetMonitorInfoW,
    MonitorFromPoint, ReleaseDC, DEVMODEW, ENUM_CURRENT_SETTINGS, HDC, HMONITOR, LOGPIXELSX,
    MONITORINFO, MONITORINFOEXW, MONITOR_DEFAULTTOPRIMARY,
};
use windows::Win32::UI::HiDpi::GetDpiForWindow;
use windows::Win32::UI::WindowsAndMessaging::GetDesktopWindow;

use crate::error::{CaptureError, Result};
use crate::geometry::Rectangle;
use crate::monitors::MonitorProbe;

/// `EnumDisplayMonitors` with a closure instead of a raw callback.
fn for_each_monitor<F>(mut visit: F) -> Result<()>
where
    F: FnMut(HMONITOR, RECT),
{
    unsafe extern "system" fn enum_proc(
        hmonitor: HMONITOR,
        _hdc: HDC,
        rect: *mut RECT,
        lparam: LPARAM,
    ) -> BOOL {
        let visit = &mut *(lparam.0 as *mut &mut dyn FnMut(HMONITOR, RECT));
        let rect = if rect.is_null() { RECT::default() } else { *rect };
        (**visit)(hmonitor, rect);
        BOOL::from(true)
    }

    let mut visit_dyn: &mut dyn FnMut(HMONITOR, RECT) = &mut visit;
    let ok = unsafe {
        EnumDisplayMonitors(
            None,
            None,
            Some(enum_proc),
            LPARAM(&mut visit_dyn as *mut &mut dyn FnMut(HMONITOR, RECT) as isize),
        )
    };
    if ok.as_bool() {
        Ok(())
    } else {
        Err(CaptureError::Enumeration(format!(
            "EnumDisplayMonitors failed: {:?}",
            unsafe { GetLastError() }
        )))
    }
}

/// Bounds at the monitor's current display mode, if the device reports one.
fn real_resolution(hmonitor: HMONITOR) -> Option<Rectangle> {
    unsafe {
        let mut info: MONITORINFOEXW = mem::zeroed();
        info.monitorInfo.cbSize = mem::size_of::<MONITORINFOEXW>() as u32;
        if !GetMonitorInfoW(hmonitor, &mut info as *mut MONITORINFOEXW as *mut MONITORINFO)
            .as_bool()
        {
            return None;
        }

        let mut devmode: DEVMODEW = mem::zeroed();
        devmode.dmSize = mem::size_of::<DEVMODEW>() as u16;
        let device_name = PCWSTR::from_raw(info.szDevice.as_ptr());
        if !EnumDisplaySettingsW(device_name, ENUM_CURRENT_SETTINGS, &mut devmode).as_bool() {
            return None;
        }

        let position = devmode.Anonymous1.Anonymous2.dmPosition;
        let (width, height) = (devmode.dmPelsWidth as i32, devmode.dmPelsHeight as i32);
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Rectangle::from_xywh(position.x, position.y, width, height))
    }
}

/// Active monitors through `EnumDisplayMonitors`
#[derive(Debug, Clone, Copy)]
pub struct Win32MonitorProbe {
    real_resolution: bool,
}

impl Win32MonitorProbe {
    pub fn new(real_resolution: bool) -> Self {
        Self { real_resolution }
    }
}

impl MonitorProbe for Win32MonitorProbe {
    fn probe(&self) -> Result<Vec<Rectangle>> {
        let mut monitors = Vec::new();
        for_each_monitor(|hmonitor, rect| {
            let raw = Rectangle::from_raw(rect.left, rect.top, rect.right, rect.bottom);
            let bounds = if self.real_resolution {
                real_resolution(hmonitor).unwrap_or_else(|| {
                    warn!("No display mode for monitor {}, using {}", monitors.len(), raw);
                    raw
                })
            } else {
                raw
            };
            monitors.push(bounds);
        })?;
        Ok(monitors)
    }

    fn count(&self) -> Result<usize> {
        let mut count = 0usize;
        for_each_monitor(|_, _| count += 1)?;
        Ok(count)
    }
}

/// Desktop window DC, released on drop
pub(crate) struct WindowDc {
    hwnd: HWND,
    hdc: HDC,
}

impl WindowDc {
    pub(crate) fn desktop() -> Result<Self> {
        let hwnd = unsafe { GetDesktopWindow() };
        let hdc = unsafe { GetDC(Some(hwnd)) };
        if hdc.is_invalid() {
            return Err(CaptureError::Acquisition(
                "GetDC returned no desktop device context".into(),
            ));
        }
        Ok(Self { hwnd, hdc })
    }

    pub(crate) fn hdc(&self) -> HDC {
        self.hdc
    }

    /// Key for the DPI cache. Stable for the desktop, unlike the DC value.
    pub(crate) fn cache_key(&self) -> isize {
        self.hwnd.0 as isize
    }

    pub(crate) fn dpi(&self) -> u32 {
        let dpi = unsafe { GetDeviceCaps(Some(self.hdc), LOGPIXELSX) };
        debug!("GetDeviceCaps(LOGPIXELSX) = {}", dpi);
        dpi.max(0) as u32
    }
}

impl Drop for WindowDc {
    fn drop(&mut self) {
        unsafe {
            ReleaseDC(Some(self.hwnd), self.hdc);
        }
    }
}

/// Desktop window handle value, used as the DPI cache key by both backends.
pub(crate) fn desktop_key() -> isize {
    unsafe { GetDesktopWindow() }.0 as isize
}

/// DPI of the desktop window. 0 means the platform did not answer.
pub(crate) fn desktop_window_dpi() -> u32 {
    let dpi = unsafe { GetDpiForWindow(GetDesktopWindow()) };
    debug!("GetDpiForWindow(desktop) = {}", dpi);
    dpi
}

/// Monitor holding the desktop origin (the primary monitor)
pub(crate) fn primary_monitor() -> Result<HMONITOR> {
    let hmonitor = unsafe { MonitorFromPoint(POINT { x: 0, y: 0 }, MONITOR_DEFAULTTOPRIMARY) };
    if hmonitor.is_invalid() {
        return Err(CaptureError::Acquisition(
            "MonitorFromPoint found no primary monitor".into(),
        ));
    }
    Ok(hmonitor)
}

/// Virtual-desktop rectangle of a monitor
pub(crate) fn monitor_rect(hmonitor: HMONITOR) -> Result<Rectangle> {
    let mut info = MONITORINFO {
        cbSize: mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };
    if !unsafe { GetMonitorInfoW(hmonitor, &mut info) }.as_bool() {
        return Err(CaptureError::Acquisition("GetMonitorInfoW failed".into()));
    }
    let r = info.rcMonitor;
    Ok(Rectangle::from_raw(r.left, r.top, r.right, r.bottom))
}
