//! Frame compositor: fits source frames into the output raster.
//!
//! The output raster only ever grows one dimension of the source to reach
//! the requested aspect ratio, so source frames are drawn centered with black
//! bars (letterbox or pillarbox) rather than cropped.

use vidsplice_common::error::{VidspliceError, VidspliceResult};

use crate::frame::{Frame, BLACK, BYTES_PER_PIXEL};

/// Output raster dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputGeometry {
    pub width: u32,
    pub height: u32,
}

impl OutputGeometry {
    /// Fit a `native_width x native_height` source to `aspect_ratio`
    /// (width / height).
    ///
    /// A wider target keeps the native height and grows the width; otherwise
    /// the native width is kept and the height grows. Fractional sizes are
    /// truncated.
    pub fn fit(native_width: u32, native_height: u32, aspect_ratio: f64) -> VidspliceResult<Self> {
        if native_width == 0 || native_height == 0 {
            return Err(VidspliceError::invalid_argument(format!(
                "source dimensions must be positive, got {native_width}x{native_height}"
            )));
        }
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(VidspliceError::invalid_argument(format!(
                "aspect ratio must be positive, got {aspect_ratio}"
            )));
        }

        let native_aspect = native_width as f64 / native_height as f64;
        let (width, height) = if aspect_ratio > native_aspect {
            (
                truncate_px(native_height as f64 * aspect_ratio),
                native_height,
            )
        } else {
            (native_width, truncate_px(native_width as f64 / aspect_ratio))
        };

        Ok(Self { width, height })
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// A black raster of this size.
    pub fn blank_frame(&self) -> Frame {
        Frame::filled(self.width, self.height, BLACK)
    }
}

/// Truncate to whole pixels, tolerating float error just below an integer.
fn truncate_px(value: f64) -> u32 {
    ((value + 1e-6).floor() as u32).max(1)
}

/// Where a source frame lands inside the output raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Largest centered placement of a `src_w x src_h` frame inside
    /// `canvas` that preserves the frame's aspect ratio.
    pub fn centered(src_w: u32, src_h: u32, canvas: OutputGeometry) -> Self {
        let scale = (canvas.width as f64 / src_w as f64).min(canvas.height as f64 / src_h as f64);
        let width = ((src_w as f64 * scale).round() as u32).clamp(1, canvas.width);
        let height = ((src_h as f64 * scale).round() as u32).clamp(1, canvas.height);
        Self {
            x: (canvas.width - width) / 2,
            y: (canvas.height - height) / 2,
            width,
            height,
        }
    }
}

/// Draw `frame` centered into `canvas`, clearing the bars to black.
///
/// Frames that already match the canvas are copied straight through;
/// anything else is resampled with nearest-neighbour.
pub fn compose(frame: &Frame, canvas: &mut Frame) {
    if frame.width() == canvas.width() && frame.height() == canvas.height() {
        canvas.data_mut().copy_from_slice(frame.data());
        return;
    }

    let geometry = OutputGeometry {
        width: canvas.width(),
        height: canvas.height(),
    };
    let placement = Placement::centered(frame.width(), frame.height(), geometry);
    canvas.fill(BLACK);

    let canvas_stride = canvas.width() as usize * BYTES_PER_PIXEL;
    let src_stride = frame.width() as usize * BYTES_PER_PIXEL;
    let identity = placement.width == frame.width() && placement.height == frame.height();
    let src = frame.data();
    let dst = canvas.data_mut();

    for row in 0..placement.height as usize {
        let dst_row =
            (placement.y as usize + row) * canvas_stride + placement.x as usize * BYTES_PER_PIXEL;
        if identity {
            let src_row = row * src_stride;
            dst[dst_row..dst_row + src_stride]
                .copy_from_slice(&src[src_row..src_row + src_stride]);
            continue;
        }

        let src_y = (row * frame.height() as usize / placement.height as usize)
            .min(frame.height() as usize - 1);
        for col in 0..placement.width as usize {
            let src_x = (col * frame.width() as usize / placement.width as usize)
                .min(frame.width() as usize - 1);
            let from = src_y * src_stride + src_x * BYTES_PER_PIXEL;
            let to = dst_row + col * BYTES_PER_PIXEL;
            dst[to..to + BYTES_PER_PIXEL].copy_from_slice(&src[from..from + BYTES_PER_PIXEL]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_square_on_landscape_grows_height() {
        let geometry = OutputGeometry::fit(1920, 1080, 1.0).unwrap();
        assert_eq!(
            geometry,
            OutputGeometry {
                width: 1920,
                height: 1920
            }
        );
    }

    #[test]
    fn test_fit_wider_target_grows_width() {
        let geometry = OutputGeometry::fit(1080, 1080, 16.0 / 9.0).unwrap();
        assert_eq!(geometry.height, 1080);
        assert_eq!(geometry.width, 1920);
    }

    #[test]
    fn test_fit_matching_aspect_is_identity() {
        let geometry = OutputGeometry::fit(1920, 1080, 16.0 / 9.0).unwrap();
        assert_eq!((geometry.width, geometry.height), (1920, 1080));
    }

    #[test]
    fn test_fit_portrait_target_on_landscape() {
        let geometry = OutputGeometry::fit(1920, 1080, 9.0 / 16.0).unwrap();
        assert_eq!(geometry.width, 1920);
        assert_eq!(geometry.height, 3413);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        assert!(OutputGeometry::fit(0, 1080, 1.0).is_err());
        assert!(OutputGeometry::fit(1920, 1080, 0.0).is_err());
        assert!(OutputGeometry::fit(1920, 1080, f64::NAN).is_err());
    }

    #[test]
    fn test_compose_pillarbox_centers_frame() {
        let frame = Frame::filled(2, 2, [255, 0, 0, 255]);
        let geometry = OutputGeometry::fit(2, 2, 2.0).unwrap();
        assert_eq!((geometry.width, geometry.height), (4, 2));

        let mut canvas = geometry.blank_frame();
        compose(&frame, &mut canvas);
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
        assert_eq!(canvas.pixel(1, 0), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(2, 1), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(3, 1), Some(BLACK));
    }

    #[test]
    fn test_compose_letterbox_centers_frame() {
        let frame = Frame::filled(4, 2, [0, 255, 0, 255]);
        let geometry = OutputGeometry::fit(4, 2, 1.0).unwrap();
        assert_eq!((geometry.width, geometry.height), (4, 4));

        let mut canvas = geometry.blank_frame();
        compose(&frame, &mut canvas);
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
        assert_eq!(canvas.pixel(0, 1), Some([0, 255, 0, 255]));
        assert_eq!(canvas.pixel(3, 2), Some([0, 255, 0, 255]));
        assert_eq!(canvas.pixel(3, 3), Some(BLACK));
    }

    #[test]
    fn test_compose_same_size_copies() {
        let frame = Frame::filled(3, 3, [1, 2, 3, 255]);
        let mut canvas = Frame::filled(3, 3, BLACK);
        compose(&frame, &mut canvas);
        assert_eq!(canvas, frame);
    }

    #[test]
    fn test_compose_scales_mismatched_frame() {
        let frame = Frame::filled(1, 1, [9, 9, 9, 255]);
        let mut canvas = Frame::filled(4, 2, [7, 7, 7, 255]);
        compose(&frame, &mut canvas);
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
        assert_eq!(canvas.pixel(1, 0), Some([9, 9, 9, 255]));
        assert_eq!(canvas.pixel(2, 1), Some([9, 9, 9, 255]));
        assert_eq!(canvas.pixel(3, 1), Some(BLACK));
    }
}
