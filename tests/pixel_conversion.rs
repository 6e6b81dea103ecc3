use screengrab::pixels::{convert_bgra_to_rgba, convert_bgra_to_rgba_parallel};
use screengrab::{CaptureError, PixelBuffer};

#[test]
fn channel_order_single_pixel() {
    let mut dst = [0u8; 4];
    convert_bgra_to_rgba(&[0x00, 0x01, 0x02, 0xFF], &mut dst);
    assert_eq!(dst, [0x02, 0x01, 0x00, 0xFF]);
}

#[test]
fn channel_order_keeps_pixel_order() {
    let src = [
        0xFF, 0x00, 0x00, 0xAA, // blue
        0x00, 0xFF, 0x00, 0x00, // green
        0x00, 0x00, 0xFF, 0x10, // red
        0x10, 0x20, 0x30, 0xFF,
    ];
    let buf = PixelBuffer::from_bgra(2, 2, &src, false).unwrap();
    assert_eq!(
        buf.as_bytes(),
        &[
            0x00, 0x00, 0xFF, 0xFF, //
            0x00, 0xFF, 0x00, 0xFF, //
            0xFF, 0x00, 0x00, 0xFF, //
            0x30, 0x20, 0x10, 0xFF,
        ]
    );
}

#[test]
fn parallel_matches_sequential() {
    // 1024x300 pixels, well past the parallel threshold
    let src: Vec<u8> = (0..1024 * 300 * 4).map(|i| (i * 31 % 251) as u8).collect();
    let mut sequential = vec![0u8; src.len()];
    let mut parallel = vec![0u8; src.len()];
    convert_bgra_to_rgba(&src, &mut sequential);
    convert_bgra_to_rgba_parallel(&src, &mut parallel);
    assert_eq!(sequential, parallel);

    let buf = PixelBuffer::from_bgra(1024, 300, &src, true).unwrap();
    assert_eq!(buf.as_bytes(), sequential.as_slice());
    assert!(buf.as_bytes().chunks_exact(4).all(|p| p[3] == 0xFF));
}

#[test]
fn buffers_are_independent() {
    let src = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let a = PixelBuffer::from_bgra(2, 1, &src, false).unwrap();
    let mut b = PixelBuffer::from_bgra(2, 1, &src, false).unwrap();
    b.as_bytes_mut()[0] = 0x42;
    assert_eq!(a.pixel(0, 0), Some([3, 2, 1, 255]));
    assert_eq!(b.pixel(0, 0), Some([0x42, 2, 1, 255]));
}

#[test]
fn short_source_is_rejected() {
    let err = PixelBuffer::from_bgra(2, 2, &[0u8; 12], false).unwrap_err();
    assert_eq!(
        err,
        CaptureError::CorruptBuffer {
            expected: 16,
            actual: 12
        }
    );
}

#[test]
fn pitch_smaller_than_row_is_rejected() {
    let err = PixelBuffer::from_bgra_pitched(4, 1, &[0u8; 16], 8, false).unwrap_err();
    assert!(matches!(err, CaptureError::CorruptBuffer { .. }));
}
