//! RGBA pixel buffers and BGRA -> RGBA conversion
//!
//! Both capture backends read 32-bit BGRA memory from the platform. Conversion
//! swaps blue and red and forces alpha to 255: screenshots are always opaque.
//! Large buffers are split into independent 4-byte aligned chunks and converted
//! on the rayon pool; the order chunks finish in does not matter.

use rayon::prelude::*;

use crate::config::convert::{PARALLEL_CHUNK_BYTES, PARALLEL_THRESHOLD_BYTES};
use crate::config::pixels::{BYTES_PER_PIXEL, OPAQUE_ALPHA};
use crate::error::{CaptureError, Result};

/// Owned RGBA8888 image, row-major, top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap RGBA bytes. The length must be exactly `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height);
        if data.len() != expected {
            return Err(CaptureError::CorruptBuffer {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Convert a tightly packed BGRA buffer into a new RGBA buffer.
    pub fn from_bgra(width: u32, height: u32, bgra: &[u8], parallel: bool) -> Result<Self> {
        let expected = byte_len(width, height);
        if bgra.len() != expected {
            return Err(CaptureError::CorruptBuffer {
                expected,
                actual: bgra.len(),
            });
        }

        let mut data = vec![0u8; expected];
        if parallel && expected >= PARALLEL_THRESHOLD_BYTES {
            convert_bgra_to_rgba_parallel(bgra, &mut data);
        } else {
            convert_bgra_to_rgba(bgra, &mut data);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Convert BGRA rows that sit `pitch` bytes apart (mapped GPU textures pad rows).
    pub fn from_bgra_pitched(
        width: u32,
        height: u32,
        src: &[u8],
        pitch: usize,
        parallel: bool,
    ) -> Result<Self> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        if pitch < row_bytes {
            return Err(CaptureError::CorruptBuffer {
                expected: row_bytes,
                actual: pitch,
            });
        }
        let needed = match height as usize {
            0 => 0,
            rows => pitch * (rows - 1) + row_bytes,
        };
        if src.len() < needed {
            return Err(CaptureError::CorruptBuffer {
                expected: needed,
                actual: src.len(),
            });
        }

        let mut data = vec![0u8; byte_len(width, height)];
        if row_bytes == 0 {
            return Self::new(width, height, data);
        }

        let convert_row = |(row, dst_row): (usize, &mut [u8])| {
            let start = row * pitch;
            convert_bgra_to_rgba(&src[start..start + row_bytes], dst_row);
        };
        if parallel && data.len() >= PARALLEL_THRESHOLD_BYTES {
            data.par_chunks_mut(row_bytes).enumerate().for_each(convert_row);
        } else {
            data.chunks_mut(row_bytes).enumerate().for_each(convert_row);
        }
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row (always `width * 4`)
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// RGBA value at (x, y), or None outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        let p = &self.data[i..i + BYTES_PER_PIXEL];
        Some([p[0], p[1], p[2], p[3]])
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

/// BGRA -> RGBA with alpha forced opaque.
///
/// `src` and `dst` must have the same length, a multiple of 4. Trailing bytes
/// that do not form a whole pixel are left untouched.
pub fn convert_bgra_to_rgba(src: &[u8], dst: &mut [u8]) {
    debug_assert_eq!(src.len(), dst.len());
    for (s, d) in src
        .chunks_exact(BYTES_PER_PIXEL)
        .zip(dst.chunks_exact_mut(BYTES_PER_PIXEL))
    {
        d[0] = s[2];
        d[1] = s[1];
        d[2] = s[0];
        d[3] = OPAQUE_ALPHA;
    }
}

/// Same as `convert_bgra_to_rgba`, spread over the rayon pool.
pub fn convert_bgra_to_rgba_parallel(src: &[u8], dst: &mut [u8]) {
    debug_assert_eq!(src.len(), dst.len());
    dst.par_chunks_mut(PARALLEL_CHUNK_BYTES)
        .zip(src.par_chunks(PARALLEL_CHUNK_BYTES))
        .for_each(|(d, s)| convert_bgra_to_rgba(s, d));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pixel() {
        let mut dst = [0u8; 4];
        convert_bgra_to_rgba(&[0x00, 0x01, 0x02, 0xFF], &mut dst);
        assert_eq!(dst, [0x02, 0x01, 0x00, 0xFF]);
    }

    #[test]
    fn source_alpha_is_discarded() {
        let mut dst = [0u8; 4];
        convert_bgra_to_rgba(&[0xFF, 0x00, 0x00, 0xAA], &mut dst);
        assert_eq!(dst, [0x00, 0x00, 0xFF, 0xFF]);
    }

    #[test]
    fn new_rejects_length_mismatch() {
        let err = PixelBuffer::new(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            CaptureError::CorruptBuffer {
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn pitched_rows_drop_padding() {
        // 1x2 image, rows padded to 8 bytes
        let src = [
            1, 2, 3, 0, 9, 9, 9, 9, //
            4, 5, 6, 0,
        ];
        let buf = PixelBuffer::from_bgra_pitched(1, 2, &src, 8, false).unwrap();
        assert_eq!(buf.as_bytes(), &[3, 2, 1, 255, 6, 5, 4, 255]);
    }

    #[test]
    fn pixel_lookup_is_row_major() {
        let buf = PixelBuffer::from_bgra(2, 1, &[0, 0, 1, 0, 0, 0, 2, 0], false).unwrap();
        assert_eq!(buf.pixel(1, 0), Some([2, 0, 0, 255]));
        assert_eq!(buf.pixel(2, 0), None);
        assert_eq!(buf.stride(), 8);
    }
}
