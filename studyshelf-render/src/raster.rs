use rayon::prelude::*;

use studyshelf_core::PageViewport;

use crate::document::PageImage;
use crate::surface::RasterSurface;

/// Scale a page image into a surface of the viewport's pixel size.
///
/// Uses bilinear sampling at pixel centres; rows are filled in parallel.
/// Page content is composited over white, so the result is opaque.
pub fn rasterize_page(page: &PageImage, viewport: &PageViewport) -> RasterSurface {
    let mut surface = RasterSurface::new_page(viewport.width, viewport.height);
    let stride = viewport.width as usize * 4;

    surface
        .pixels
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(py, row)| {
            for (px, out) in row.chunks_exact_mut(4).enumerate() {
                let (x, y) = viewport.pixel_to_page(px as u32, py as u32);
                let rgba = sample_bilinear(page, x - 0.5, y - 0.5);
                let a = rgba[3] / 255.0;
                for c in 0..3 {
                    out[c] = (rgba[c] * a + 255.0 * (1.0 - a)).round().clamp(0.0, 255.0) as u8;
                }
                out[3] = 255;
            }
        });

    surface
}

/// Sample at continuous texel coordinates (texel centres at integers),
/// clamping at the edges.
fn sample_bilinear(page: &PageImage, x: f64, y: f64) -> [f64; 4] {
    let max_x = (page.width - 1) as f64;
    let max_y = (page.height - 1) as f64;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(page.width - 1);
    let y1 = (y0 + 1).min(page.height - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let texel = |tx: u32, ty: u32| {
        let i = (ty as usize * page.width as usize + tx as usize) * 4;
        &page.pixels[i..i + 4]
    };
    let (p00, p10, p01, p11) = (texel(x0, y0), texel(x1, y0), texel(x0, y1), texel(x1, y1));

    let mut out = [0.0; 4];
    for c in 0..4 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = top * (1.0 - fy) + bottom * fy;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyshelf_core::PageSize;

    fn viewport(page: &PageImage, scale: f64) -> PageViewport {
        PageViewport::new(page.size(), scale).unwrap()
    }

    #[test]
    fn unit_scale_copies_pixels() {
        let page = PageImage::solid(3, 2, [10, 20, 30, 255]).unwrap();
        let surface = rasterize_page(&page, &viewport(&page, 1.0));
        assert_eq!((surface.width, surface.height), (3, 2));
        assert!(surface.pixels.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
    }

    #[test]
    fn scaled_output_has_viewport_size() {
        let page = PageImage::solid(10, 20, [0, 0, 0, 255]).unwrap();
        let surface = rasterize_page(&page, &viewport(&page, 1.4));
        assert_eq!((surface.width, surface.height), (14, 28));
    }

    #[test]
    fn transparent_content_lands_on_white() {
        let page = PageImage::solid(2, 2, [0, 0, 0, 0]).unwrap();
        let surface = rasterize_page(&page, &viewport(&page, 2.0));
        assert!(surface.pixels.iter().all(|&b| b == 255));
    }

    #[test]
    fn halves_of_a_split_page_stay_apart() {
        // Left half red, right half blue, sampled at 2x.
        let mut pixels = Vec::new();
        for _ in 0..4 {
            pixels.extend_from_slice(&[255, 0, 0, 255, 255, 0, 0, 255]);
            pixels.extend_from_slice(&[0, 0, 255, 255, 0, 0, 255, 255]);
        }
        let page = PageImage::new(4, 4, pixels).unwrap();
        let vp = PageViewport::new(PageSize::new(4.0, 4.0).unwrap(), 2.0).unwrap();
        let surface = rasterize_page(&page, &vp);

        assert_eq!(surface.pixel(0, 3), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(7, 3), Some([0, 0, 255, 255]));
    }
}
