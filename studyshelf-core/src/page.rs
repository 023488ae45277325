use crate::error::CoreError;

/// Largest page raster allowed, in pixels (256 MiB of RGBA).
pub const MAX_VIEWPORT_PIXELS: u64 = 64 * 1024 * 1024;

/// Intrinsic size of a page at scale 1.0, in page units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> crate::Result<Self> {
        if width <= 0.0 || height <= 0.0 || !width.is_finite() || !height.is_finite() {
            return Err(CoreError::InvalidPageSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// The aspect ratio of the page (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// The visible page region at a given zoom scale.
///
/// Pixel dimensions are the intrinsic size times `scale`, truncated, and
/// never smaller than one pixel. The pixel count is capped at
/// [`MAX_VIEWPORT_PIXELS`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageViewport {
    pub scale: f64,

    /// Viewport width in pixels.
    pub width: u32,

    /// Viewport height in pixels.
    pub height: u32,
}

impl PageViewport {
    pub fn new(size: PageSize, scale: f64) -> crate::Result<Self> {
        if scale <= 0.0 || !scale.is_finite() {
            return Err(CoreError::InvalidScale(scale));
        }
        let width = to_pixels(size.width * scale);
        let height = to_pixels(size.height * scale);
        let too_large = u64::from(width)
            .checked_mul(u64::from(height))
            .map_or(true, |pixels| pixels > MAX_VIEWPORT_PIXELS);
        if too_large {
            return Err(CoreError::ViewportTooLarge {
                width,
                height,
                limit: MAX_VIEWPORT_PIXELS,
            });
        }
        Ok(Self {
            scale,
            width,
            height,
        })
    }

    /// Map a viewport pixel centre back to intrinsic page coordinates.
    #[inline]
    pub fn pixel_to_page(&self, px: u32, py: u32) -> (f64, f64) {
        (
            (px as f64 + 0.5) / self.scale,
            (py as f64 + 0.5) / self.scale,
        )
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

// Stepped scales are inexact in binary; absorb the rounding error before
// truncating. The cast saturates at u32::MAX.
fn to_pixels(extent: f64) -> u32 {
    ((extent + 1e-6).floor() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn unit_scale_matches_intrinsic_size() {
        let size = PageSize::new(612.0, 792.0).unwrap();
        let vp = PageViewport::new(size, 1.0).unwrap();
        assert_eq!((vp.width, vp.height), (612, 792));
    }

    #[test]
    fn fractional_dimensions_truncate() {
        let size = PageSize::new(100.0, 50.0).unwrap();
        let vp = PageViewport::new(size, 1.25).unwrap();
        assert_eq!((vp.width, vp.height), (125, 62));
    }

    #[test]
    fn tiny_scale_keeps_one_pixel() {
        let size = PageSize::new(10.0, 10.0).unwrap();
        let vp = PageViewport::new(size, 0.01).unwrap();
        assert_eq!((vp.width, vp.height), (1, 1));
    }

    #[test]
    fn pixel_to_page_inverts_scale() {
        let size = PageSize::new(100.0, 100.0).unwrap();
        let vp = PageViewport::new(size, 2.0).unwrap();
        let (x, y) = vp.pixel_to_page(0, 199);
        assert!((x - 0.25).abs() < EPSILON);
        assert!((y - 99.75).abs() < EPSILON);
    }

    #[test]
    fn invalid_scale() {
        let size = PageSize::new(10.0, 10.0).unwrap();
        assert!(PageViewport::new(size, 0.0).is_err());
        assert!(PageViewport::new(size, -1.0).is_err());
        assert!(PageViewport::new(size, f64::INFINITY).is_err());
    }

    #[test]
    fn huge_scale_is_rejected() {
        let size = PageSize::new(10.0, 10.0).unwrap();
        assert!(matches!(
            PageViewport::new(size, 1e12),
            Err(CoreError::ViewportTooLarge {
                width: u32::MAX,
                height: u32::MAX,
                ..
            })
        ));
        // One side alone can blow the budget.
        let strip = PageSize::new(1.0, 1e9).unwrap();
        assert!(PageViewport::new(strip, 1.0).is_err());
    }

    #[test]
    fn limit_is_inclusive() {
        let size = PageSize::new(8192.0, 8192.0).unwrap();
        let vp = PageViewport::new(size, 1.0).unwrap();
        assert_eq!(vp.pixel_count() as u64, MAX_VIEWPORT_PIXELS);
        assert!(PageViewport::new(size, 1.001).is_err());
    }

    #[test]
    fn invalid_page_size() {
        assert!(PageSize::new(0.0, 10.0).is_err());
        assert!(PageSize::new(10.0, -1.0).is_err());
    }
}
