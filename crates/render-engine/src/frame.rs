//! Raster frames exchanged between sources, the compositor, and sinks.

use vidsplice_common::error::{VidspliceError, VidspliceResult};

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Opaque black in RGBA8.
pub const BLACK: [u8; 4] = [0, 0, 0, 255];

/// A tightly packed RGBA8 raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap raw RGBA8 bytes, checking the buffer matches the dimensions.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> VidspliceResult<Self> {
        let expected = buffer_len(width, height);
        if width == 0 || height == 0 || data.len() != expected {
            return Err(VidspliceError::invalid_argument(format!(
                "RGBA buffer of {} bytes does not match {width}x{height} (expected {expected})",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame filled with one color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(buffer_len(width, height))
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.data[at..at + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Overwrite every pixel with `rgba`.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&rgba);
        }
    }
}

fn buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(Frame::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(Frame::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(Frame::from_rgba(0, 2, vec![]).is_err());
    }

    #[test]
    fn test_filled_and_pixel_access() {
        let mut frame = Frame::filled(3, 2, [10, 20, 30, 255]);
        assert_eq!(frame.pixel(2, 1), Some([10, 20, 30, 255]));
        assert_eq!(frame.pixel(3, 0), None);

        frame.fill(BLACK);
        assert_eq!(frame.pixel(0, 0), Some(BLACK));
    }
}
