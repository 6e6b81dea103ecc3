// capture/windows/wgc.rs - Windows.Graphics.Capture backend
//
// A capture session bound to the primary monitor feeds a free-threaded frame
// pool. Each capture pulls the next frame, copies the requested region through
// a CPU-readable staging texture, and keeps the frame until the next call.
// WGC is available on Windows 10 version 1803 and later.

use std::marker::PhantomData;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use windows::core::Interface;
use windows::Graphics::Capture::{
    Direct3D11CaptureFrame, Direct3D11CaptureFramePool, GraphicsCaptureItem,
    GraphicsCaptureSession,
};
use windows::Graphics::DirectX::Direct3D11::IDirect3DDevice;
use windows::Graphics::DirectX::DirectXPixelFormat;
use windows::Win32::Foundation::HMODULE;
use windows::Win32::Graphics::Direct3D::D3D_DRIVER_TYPE_HARDWARE;
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11Texture2D, D3D11_BOX,
    D3D11_CPU_ACCESS_READ, D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_MAPPED_SUBRESOURCE,
    D3D11_MAP_READ, D3D11_SDK_VERSION, D3D11_TEXTURE2D_DESC, D3D11_USAGE_STAGING,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_SAMPLE_DESC};
use windows::Win32::Graphics::Dxgi::IDXGIDevice;
use windows::Win32::System::WinRT::Direct3D11::{
    CreateDirect3D11DeviceFromDXGIDevice, IDirect3DDxgiInterfaceAccess,
};
use windows::Win32::System::WinRT::Graphics::Capture::IGraphicsCaptureItemInterop;
use windows::Win32::System::WinRT::{RoInitialize, RoUninitialize, RO_INIT_MULTITHREADED};

use super::display::{self, Win32MonitorProbe};
use crate::capture::{BackendKind, ScreenCapturer};
use crate::config::pixels::BYTES_PER_PIXEL;
use crate::config::wgc::{FRAME_POLL_INTERVAL_MS, FRAME_POOL_BUFFERS, FRAME_WAIT_TIMEOUT_MS};
use crate::dpi::{scale_for_dpi, DpiCache};
use crate::error::{CaptureError, Result};
use crate::geometry::Rectangle;
use crate::monitors::MonitorEnumerator;
use crate::pixels::PixelBuffer;
use crate::settings::CaptureSettings;

/// True when the OS exposes Windows.Graphics.Capture.
pub fn is_supported() -> bool {
    GraphicsCaptureSession::IsSupported().unwrap_or(false)
}

fn acquisition(what: &str, e: windows::core::Error) -> CaptureError {
    CaptureError::Acquisition(format!("{}: {}", what, e))
}

/// Staging texture mapped for reading; unmapped on drop
struct MappedTexture<'a> {
    context: &'a ID3D11DeviceContext,
    texture: &'a ID3D11Texture2D,
    mapped: D3D11_MAPPED_SUBRESOURCE,
}

impl<'a> MappedTexture<'a> {
    fn map(context: &'a ID3D11DeviceContext, texture: &'a ID3D11Texture2D) -> Result<Self> {
        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe { context.Map(texture, 0, D3D11_MAP_READ, 0, Some(&mut mapped)) }
            .map_err(|e| CaptureError::Blit(format!("Map of staging texture failed: {}", e)))?;
        Ok(Self {
            context,
            texture,
            mapped,
        })
    }

    fn pitch(&self) -> usize {
        self.mapped.RowPitch as usize
    }

    /// Mapped bytes covering `height` rows of `row_bytes` each.
    fn bytes(&self, row_bytes: usize, height: usize) -> &[u8] {
        let len = match height {
            0 => 0,
            rows => self.pitch() * (rows - 1) + row_bytes,
        };
        unsafe { std::slice::from_raw_parts(self.mapped.pData as *const u8, len) }
    }
}

impl Drop for MappedTexture<'_> {
    fn drop(&mut self) {
        unsafe { self.context.Unmap(self.texture, 0) };
    }
}

/// Frame-pool capture of the primary monitor
///
/// Stays on the thread that opened it. `close` balances that thread's
/// `RoInitialize`, so the capturer is not `Send`:
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<screengrab::WgcCapturer>();
/// ```
pub struct WgcCapturer {
    monitors: MonitorEnumerator<Win32MonitorProbe>,
    dpi_cache: DpiCache<isize>,
    dpi_scaling: bool,
    parallel_convert: bool,
    monitor_bounds: Rectangle,

    // Released by close() in this order
    session: Option<GraphicsCaptureSession>,
    last_frame: Option<Direct3D11CaptureFrame>,
    frame_pool: Option<Direct3D11CaptureFramePool>,
    item: Option<GraphicsCaptureItem>,
    d3d_context: Option<ID3D11DeviceContext>,
    direct3d_device: Option<IDirect3DDevice>,
    d3d_device: Option<ID3D11Device>,
    ro_initialized: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl WgcCapturer {
    /// Start a capture session on the primary monitor.
    pub fn open(settings: &CaptureSettings) -> Result<Self> {
        if !is_supported() {
            return Err(CaptureError::UnsupportedPlatform(
                "Windows.Graphics.Capture is not available on this system".into(),
            ));
        }

        let mut capturer = Self {
            monitors: MonitorEnumerator::new(
                Win32MonitorProbe::new(settings.real_resolution),
                settings.cache_monitors,
            ),
            dpi_cache: DpiCache::new(),
            dpi_scaling: settings.dpi_scaling,
            parallel_convert: settings.parallel_convert,
            monitor_bounds: Rectangle::EMPTY,
            session: None,
            last_frame: None,
            frame_pool: None,
            item: None,
            d3d_context: None,
            direct3d_device: None,
            d3d_device: None,
            ro_initialized: false,
            _thread_bound: PhantomData,
        };
        // On error, dropping the half-built capturer releases what was created
        capturer.start(settings.show_cursor)?;
        Ok(capturer)
    }

    fn start(&mut self, show_cursor: bool) -> Result<()> {
        match unsafe { RoInitialize(RO_INIT_MULTITHREADED) } {
            Ok(()) => self.ro_initialized = true,
            // Already initialized with another apartment model on this thread
            Err(e) => warn!("RoInitialize failed, continuing: {}", e),
        }

        let (d3d_device, d3d_context) = Self::create_d3d_device()?;
        self.d3d_context = Some(d3d_context);
        debug!("Created D3D11 device");

        let direct3d_device = Self::create_direct3d_device(&d3d_device)?;
        self.d3d_device = Some(d3d_device);

        let hmonitor = display::primary_monitor()?;
        self.monitor_bounds = display::monitor_rect(hmonitor)?;
        let interop = windows::core::factory::<GraphicsCaptureItem, IGraphicsCaptureItemInterop>()
            .map_err(|e| acquisition("IGraphicsCaptureItemInterop unavailable", e))?;
        let item: GraphicsCaptureItem = unsafe { interop.CreateForMonitor(hmonitor) }
            .map_err(|e| acquisition("CreateForMonitor failed", e))?;
        let size = item
            .Size()
            .map_err(|e| acquisition("GraphicsCaptureItem::Size failed", e))?;
        info!(
            "Capture item for primary monitor {} ({}x{} surface)",
            self.monitor_bounds, size.Width, size.Height
        );

        let frame_pool = Direct3D11CaptureFramePool::CreateFreeThreaded(
            &direct3d_device,
            DirectXPixelFormat::B8G8R8A8UIntNormalized,
            FRAME_POOL_BUFFERS,
            size,
        )
        .map_err(|e| CaptureError::Allocation(format!("CreateFreeThreaded failed: {}", e)))?;
        self.direct3d_device = Some(direct3d_device);

        let session = frame_pool
            .CreateCaptureSession(&item)
            .map_err(|e| acquisition("CreateCaptureSession failed", e))?;
        self.item = Some(item);
        self.frame_pool = Some(frame_pool);

        if let Err(e) = session.SetIsCursorCaptureEnabled(show_cursor) {
            warn!("SetIsCursorCaptureEnabled failed: {:?}", e);
        }
        // Windows 11 only
        if session.SetIsBorderRequired(false).is_err() {
            debug!("SetIsBorderRequired not supported");
        }

        session
            .StartCapture()
            .map_err(|e| acquisition("StartCapture failed", e))?;
        self.session = Some(session);
        info!("WGC capture session started");
        Ok(())
    }

    fn create_d3d_device() -> Result<(ID3D11Device, ID3D11DeviceContext)> {
        let mut device = None;
        let mut context = None;

        unsafe {
            D3D11CreateDevice(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                HMODULE::default(),
                D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                None,
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                Some(&mut context),
            )
        }
        .map_err(|e| acquisition("D3D11CreateDevice failed", e))?;

        match (device, context) {
            (Some(device), Some(context)) => Ok((device, context)),
            _ => Err(CaptureError::Acquisition(
                "D3D11CreateDevice returned no device".into(),
            )),
        }
    }

    fn create_direct3d_device(d3d_device: &ID3D11Device) -> Result<IDirect3DDevice> {
        let dxgi_device: IDXGIDevice = d3d_device
            .cast()
            .map_err(|e| acquisition("ID3D11Device is not an IDXGIDevice", e))?;
        unsafe { CreateDirect3D11DeviceFromDXGIDevice(&dxgi_device) }
            .and_then(|inspectable| inspectable.cast::<IDirect3DDevice>())
            .map_err(|e| acquisition("CreateDirect3D11DeviceFromDXGIDevice failed", e))
    }

    fn resolve_dpi(&self, logical: bool) -> u32 {
        if !logical || !self.dpi_scaling {
            return crate::config::dpi::BASELINE_DPI;
        }
        self.dpi_cache
            .get_or_insert_with(display::desktop_key(), display::desktop_window_dpi)
    }

    /// Newest frame in the pool, polling until the timeout when it is empty.
    fn next_frame(&self) -> Result<Direct3D11CaptureFrame> {
        let pool = self
            .frame_pool
            .as_ref()
            .ok_or_else(|| CaptureError::Acquisition("capture session is closed".into()))?;

        // The pool hands out the oldest queued frame first
        let mut newest: Option<Direct3D11CaptureFrame> = None;
        while let Ok(frame) = pool.TryGetNextFrame() {
            if let Some(stale) = newest.replace(frame) {
                trace!("Skipping queued frame");
                let _ = stale.Close();
            }
        }
        if let Some(frame) = newest {
            return Ok(frame);
        }

        let deadline = Instant::now() + Duration::from_millis(FRAME_WAIT_TIMEOUT_MS);
        loop {
            match pool.TryGetNextFrame() {
                Ok(frame) => return Ok(frame),
                Err(e) if Instant::now() >= deadline => {
                    return Err(CaptureError::Acquisition(format!(
                        "no frame within {} ms: {}",
                        FRAME_WAIT_TIMEOUT_MS, e
                    )));
                }
                Err(_) => std::thread::sleep(Duration::from_millis(FRAME_POLL_INTERVAL_MS)),
            }
        }
    }

    fn frame_texture(frame: &Direct3D11CaptureFrame) -> Result<ID3D11Texture2D> {
        let surface = frame
            .Surface()
            .map_err(|e| acquisition("frame has no surface", e))?;
        let access: IDirect3DDxgiInterfaceAccess = surface
            .cast()
            .map_err(|e| acquisition("surface is not DXGI-backed", e))?;
        unsafe { access.GetInterface::<ID3D11Texture2D>() }
            .map_err(|e| acquisition("surface is not a D3D11 texture", e))
    }

    /// Copy `region` (texture coordinates) out of the frame texture.
    fn copy_region(&self, source: &ID3D11Texture2D, region: &Rectangle) -> Result<PixelBuffer> {
        let (device, context) = match (&self.d3d_device, &self.d3d_context) {
            (Some(device), Some(context)) => (device, context),
            _ => {
                return Err(CaptureError::Acquisition(
                    "capture session is closed".into(),
                ))
            }
        };
        let (width, height) = (region.width() as u32, region.height() as u32);

        let staging_desc = D3D11_TEXTURE2D_DESC {
            Width: width,
            Height: height,
            MipLevels: 1,
            ArraySize: 1,
            Format: DXGI_FORMAT_B8G8R8A8_UNORM,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Usage: D3D11_USAGE_STAGING,
            BindFlags: 0,
            CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
            MiscFlags: 0,
        };

        let mut staging = None;
        unsafe { device.CreateTexture2D(&staging_desc, None, Some(&mut staging)) }
            .map_err(|e| CaptureError::Allocation(format!("staging texture: {}", e)))?;
        let staging = staging.ok_or_else(|| {
            CaptureError::Allocation("CreateTexture2D returned no texture".into())
        })?;

        let src_box = D3D11_BOX {
            left: region.left as u32,
            top: region.top as u32,
            front: 0,
            right: region.right as u32,
            bottom: region.bottom as u32,
            back: 1,
        };
        unsafe {
            context.CopySubresourceRegion(&staging, 0, 0, 0, 0, source, 0, Some(&src_box));
        }

        let mapped = MappedTexture::map(context, &staging)?;
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        PixelBuffer::from_bgra_pitched(
            width,
            height,
            mapped.bytes(row_bytes, height as usize),
            mapped.pitch(),
            self.parallel_convert,
        )
    }

    /// Copy a region of the primary monitor. `logical` coordinates are
    /// DPI-scaled when scaling is enabled.
    pub fn grab(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        logical: bool,
    ) -> Result<PixelBuffer> {
        if width <= 0 || height <= 0 {
            return Err(CaptureError::dimension(width, height));
        }

        let dpi = self.resolve_dpi(logical);
        let requested = Rectangle::from_xywh(
            scale_for_dpi(x, dpi),
            scale_for_dpi(y, dpi),
            scale_for_dpi(width, dpi),
            scale_for_dpi(height, dpi),
        );
        if requested.is_empty() {
            return Err(CaptureError::dimension(requested.width(), requested.height()));
        }
        if !self.monitor_bounds.contains(&requested) {
            warn!(
                "Region {} lies outside the captured monitor {}",
                requested, self.monitor_bounds
            );
            return Err(CaptureError::dimension(requested.width(), requested.height()));
        }

        // Give the held buffer back to the pool before taking a new one
        if let Some(previous) = self.last_frame.take() {
            let _ = previous.Close();
        }
        let frame = self.next_frame()?;
        let texture = Self::frame_texture(&frame)?;
        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { texture.GetDesc(&mut desc) };

        let (origin_x, origin_y) = self.monitor_bounds.origin();
        let region = Rectangle::new(
            requested.left - origin_x,
            requested.top - origin_y,
            requested.right - origin_x,
            requested.bottom - origin_y,
        );
        let surface = Rectangle::new(0, 0, desc.Width as i32, desc.Height as i32);

        // Hold on to the frame until the next capture or close
        self.last_frame = Some(frame);

        if !surface.contains(&region) {
            return Err(CaptureError::dimension(region.width(), region.height()));
        }
        trace!("WGC capture {} of {} surface at {} DPI", region, surface, dpi);
        self.copy_region(&texture, &region)
    }

    /// Forget cached monitors and DPI values.
    pub fn invalidate_caches(&self) {
        self.monitors.invalidate();
        self.dpi_cache.invalidate();
    }

    pub fn monitors(&self) -> &MonitorEnumerator<Win32MonitorProbe> {
        &self.monitors
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Release the session and every resource behind it. Safe to call twice.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            info!("Stopping WGC capture");
            let _ = session.Close();
        }
        if let Some(frame) = self.last_frame.take() {
            let _ = frame.Close();
        }
        if let Some(pool) = self.frame_pool.take() {
            let _ = pool.Close();
        }
        self.item = None;
        if let Some(context) = self.d3d_context.take() {
            unsafe { context.ClearState() };
        }
        if let Some(device) = self.direct3d_device.take() {
            let _ = device.Close();
        }
        self.d3d_device = None;
        if self.ro_initialized {
            unsafe { RoUninitialize() };
            self.ro_initialized = false;
        }
    }
}

impl Drop for WgcCapturer {
    fn drop(&mut self) {
        self.close();
    }
}

impl ScreenCapturer for WgcCapturer {
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
        BackendKind::Wgc
    }
}
