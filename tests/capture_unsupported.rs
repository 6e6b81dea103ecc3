#![cfg(not(target_os = "windows"))]

use screengrab::{capture, BackendKind, CaptureError, CaptureSettings, Rectangle, ScreenCapturer};

#[test]
fn open_succeeds_but_capture_is_unsupported() {
    let mut capturer = capture::open(&CaptureSettings::default()).unwrap();
    assert_eq!(capturer.backend(), BackendKind::Gdi);
    assert!(matches!(
        capturer.capture(0, 0, 100, 100),
        Err(CaptureError::UnsupportedPlatform(_))
    ));
    assert!(matches!(
        capturer.capture_rect(&Rectangle::from_xywh(0, 0, 10, 10)),
        Err(CaptureError::UnsupportedPlatform(_))
    ));
    assert!(matches!(
        capturer.display_bounds(0),
        Err(CaptureError::UnsupportedPlatform(_))
    ));
    assert_eq!(capturer.num_active_displays(), 0);
    capturer.close();
}

#[test]
fn compositor_capture_is_unavailable() {
    assert!(!capture::is_compositor_capture_supported());
}
