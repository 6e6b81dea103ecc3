#![cfg(target_os = "windows")]

// Live-desktop tests. They need an interactive session with at least one monitor.

use screengrab::{
    capture, BackendKind, CaptureError, CaptureSettings, Rectangle, ScreenCapturer,
};

fn gdi() -> screengrab::Capturer {
    capture::open(&CaptureSettings::default()).unwrap()
}

#[test]
fn display_bounds_match_enumeration() {
    let capturer = gdi();
    let all = capturer.all_display_bounds().unwrap();
    assert!(!all.is_empty());
    assert_eq!(capturer.num_active_displays(), all.len());
    for (i, bounds) in all.iter().enumerate() {
        assert_eq!(capturer.display_bounds(i as i64).unwrap(), *bounds);
        assert!(!bounds.is_empty());
    }
}

#[test]
fn bad_display_index_is_an_index_error() {
    let capturer = gdi();
    let count = capturer.all_display_bounds().unwrap().len();
    assert!(matches!(
        capturer.display_bounds(-1),
        Err(CaptureError::Index { index: -1, .. })
    ));
    assert!(matches!(
        capturer.display_bounds(count as i64),
        Err(CaptureError::Index { .. })
    ));
}

#[test]
fn zero_size_capture_is_a_dimension_error() {
    let mut capturer = gdi();
    assert!(matches!(
        capturer.capture(0, 0, 0, 10),
        Err(CaptureError::Dimension { .. })
    ));
    assert!(matches!(
        capturer.capture(0, 0, 10, -1),
        Err(CaptureError::Dimension { .. })
    ));
}

#[test]
fn display_capture_is_opaque_and_sized() {
    let mut capturer = gdi();
    let bounds = capturer.display_bounds(0).unwrap();
    let image = capturer.capture_display(0).unwrap();
    assert_eq!((image.width() as i32, image.height() as i32), bounds.size());
    assert_eq!(
        image.as_bytes().len(),
        image.width() as usize * image.height() as usize * 4
    );
    assert!(image.as_bytes().chunks_exact(4).all(|p| p[3] == 0xFF));
}

#[test]
fn display_capture_is_not_rescaled_with_dpi_scaling_on() {
    let settings = CaptureSettings {
        dpi_scaling: true,
        ..Default::default()
    };
    let mut capturer = capture::open(&settings).unwrap();
    let bounds = capturer.display_bounds(0).unwrap();
    let image = capturer.capture_display(0).unwrap();
    assert_eq!((image.width() as i32, image.height() as i32), bounds.size());
}

#[test]
fn region_capture_has_the_requested_size() {
    let mut capturer = gdi();
    let image = capturer.capture(10, 20, 37, 11).unwrap();
    assert_eq!((image.width(), image.height()), (37, 11));
    assert_eq!(image.as_bytes().len(), 37 * 11 * 4);
}

#[test]
fn union_capture_matches_bounding_box() {
    let mut capturer = gdi();
    let all = Rectangle::bounding(&capturer.all_display_bounds().unwrap());
    let image = capturer.capture_all().unwrap();
    assert_eq!((image.width() as i32, image.height() as i32), all.size());
}

#[test]
fn region_past_the_desktop_edge_is_clipped_to_black() {
    let mut capturer = gdi();
    let desktop = Rectangle::bounding(&capturer.all_display_bounds().unwrap());
    // Half inside the right edge of the virtual desktop, half outside
    let region = Rectangle::from_xywh(desktop.right - 8, desktop.top, 16, 16);
    let image = capturer.capture_rect(&region).unwrap();
    assert_eq!((image.width(), image.height()), (16, 16));
    for y in 0..16 {
        for x in 8..16 {
            assert_eq!(image.pixel(x, y), Some([0, 0, 0, 0xFF]), "pixel ({}, {})", x, y);
        }
    }
}

#[test]
fn consecutive_captures_are_independent() {
    let mut capturer = gdi();
    let first = capturer.capture(0, 0, 16, 16).unwrap();
    let mut second = capturer.capture(0, 0, 16, 16).unwrap();
    let before = first.clone();
    second.as_bytes_mut().fill(0);
    assert_eq!(first, before);
}

#[test]
fn explicit_wgc_opens_or_reports_unsupported() {
    let settings = CaptureSettings {
        backend: BackendKind::Wgc,
        ..Default::default()
    };
    match capture::open(&settings) {
        Ok(mut capturer) => {
            assert_eq!(capturer.backend(), BackendKind::Wgc);
            let image = capturer.capture(0, 0, 32, 32).unwrap();
            assert_eq!((image.width(), image.height()), (32, 32));
            let again = capturer.capture_rect(&Rectangle::from_xywh(0, 0, 16, 8)).unwrap();
            assert_eq!((again.width(), again.height()), (16, 8));
            assert_eq!(image.pixel(0, 0).map(|p| p[3]), Some(0xFF));
            capturer.close();
            capturer.close();
        }
        Err(CaptureError::UnsupportedPlatform(_)) => {
            assert!(!capture::is_compositor_capture_supported());
        }
        // Headless machines without a hardware D3D11 device
        Err(CaptureError::Acquisition(e)) => eprintln!("WGC not available: {}", e),
        Err(e) => panic!("unexpected WGC failure: {}", e),
    }
}

#[test]
fn auto_never_fails_to_open() {
    let settings = CaptureSettings {
        backend: BackendKind::Auto,
        ..Default::default()
    };
    let capturer = capture::open(&settings).unwrap();
    assert_ne!(capturer.backend(), BackendKind::Auto);
}
