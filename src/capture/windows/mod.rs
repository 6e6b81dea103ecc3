// capture/windows - Win32 capture backends

pub mod display;
pub mod gdi;
pub mod wgc;

pub use display::Win32MonitorProbe;
pub use gdi::GdiCapturer;
pub use wgc::WgcCapturer;
