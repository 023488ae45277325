use studyshelf_core::{BlendMode, Point, Segment};

use crate::error::RenderError;

/// An RGBA pixel buffer that pages and annotations are drawn into.
///
/// Pixels are unpremultiplied, 4 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterSurface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 4],
        }
    }

    /// Create an opaque white surface, the background of a page.
    pub fn new_page(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![255u8; width as usize * height as usize * 4],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// RGBA value at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Resize to `width`×`height`. The content is discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize * 4, 0);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Draw a round-capped thick line.
    pub fn draw_segment(&mut self, segment: &Segment) {
        if self.is_empty() {
            return;
        }
        let radius = (segment.style.width / 2.0).max(0.5);
        let (from, to) = (segment.from, segment.to);

        let min_x = (from.x.min(to.x) - radius).floor().max(0.0) as u32;
        let min_y = (from.y.min(to.y) - radius).floor().max(0.0) as u32;
        let max_x = (from.x.max(to.x) + radius).ceil().min(self.width as f32 - 1.0);
        let max_y = (from.y.max(to.y) + radius).ceil().min(self.height as f32 - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let (max_x, max_y) = (max_x as u32, max_y as u32);

        let color = segment.style.color;
        let src = [color.r, color.g, color.b];
        let alpha = segment.style.alpha.clamp(0.0, 1.0);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let centre = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_segment(centre, from, to) > radius {
                    continue;
                }
                let i = self.index(x, y);
                let px = &mut self.pixels[i..i + 4];
                match segment.style.mode {
                    BlendMode::SourceOver => blend_over(px, src, alpha),
                    BlendMode::Erase => {
                        px[3] = (px[3] as f32 * (1.0 - alpha)).round() as u8;
                    }
                }
            }
        }
    }

    /// Blend `top` over this surface. Both must have the same dimensions.
    pub fn composite_over(&mut self, top: &RasterSurface) -> crate::Result<()> {
        if top.width != self.width || top.height != self.height {
            return Err(RenderError::InvalidDimensions {
                width: top.width,
                height: top.height,
            });
        }
        for (dst, src) in self
            .pixels
            .chunks_exact_mut(4)
            .zip(top.pixels.chunks_exact(4))
        {
            if src[3] == 0 {
                continue;
            }
            blend_over(dst, [src[0], src[1], src[2]], src[3] as f32 / 255.0);
        }
        Ok(())
    }
}

/// Porter-Duff source-over on unpremultiplied RGBA.
fn blend_over(dst: &mut [u8], src: [u8; 3], alpha: f32) {
    let da = dst[3] as f32 / 255.0;
    let out_a = alpha + da * (1.0 - alpha);
    if out_a <= 0.0 {
        dst.fill(0);
        return;
    }
    for c in 0..3 {
        let value = (src[c] as f32 * alpha + dst[c] as f32 * da * (1.0 - alpha)) / out_a;
        dst[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}
