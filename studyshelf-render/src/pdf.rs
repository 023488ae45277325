//! PDF books drawn with MuPDF.

use std::path::{Path, PathBuf};

use mupdf::{Colorspace, Document as PdfFile, Matrix, Pixmap};
use tracing::debug;

use studyshelf_core::{PageSize, PageViewport};

use crate::document::{page_count_of, Document, PageImage};
use crate::error::RenderError;

/// A PDF book.
///
/// MuPDF handles stay on the thread that opened them, so only page sizes
/// are kept and every draw reopens the file.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    path: PathBuf,
    /// Page sizes in points, the size at scale 1.0.
    pages: Vec<PageSize>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> crate::Result<Self> {
        let file = load(path)?;
        let count = file.page_count().map_err(|e| pdf_error(path, e))?;

        let mut pages = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
        for index in 0..count {
            let page = file.load_page(index).map_err(|e| pdf_error(path, e))?;
            let bounds = page.bounds().map_err(|e| pdf_error(path, e))?;
            pages.push(PageSize::new(
                f64::from(bounds.x1 - bounds.x0),
                f64::from(bounds.y1 - bounds.y0),
            )?);
        }
        if pages.is_empty() {
            return Err(RenderError::EmptyDocument(path.to_path_buf()));
        }

        debug!(pages = pages.len(), "Read PDF {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            pages,
        })
    }

    pub fn page_size(&self, number: u32) -> crate::Result<PageSize> {
        self.check_page(number)?;
        Ok(self.pages[number as usize - 1])
    }

    fn draw(&self, number: u32, scale: f64) -> crate::Result<PageImage> {
        // Size check before MuPDF allocates the pixmap.
        PageViewport::new(self.page_size(number)?, scale)?;

        let file = load(&self.path)?;
        // In range: `number` was checked against a count MuPDF gave as i32.
        let page = file
            .load_page((number - 1) as i32)
            .map_err(|e| pdf_error(&self.path, e))?;
        let matrix = Matrix::new_scale(scale as f32, scale as f32);
        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), false, false)
            .map_err(|e| pdf_error(&self.path, e))?;
        pixmap_to_page(&self.path, &pixmap)
    }
}

impl Document for PdfDocument {
    fn page_count(&self) -> u32 {
        page_count_of(self.pages.len())
    }

    fn page(&self, number: u32) -> crate::Result<PageImage> {
        self.draw(number, 1.0)
    }

    fn draw_page(&self, number: u32, scale: f64) -> crate::Result<Option<PageImage>> {
        self.draw(number, scale).map(Some)
    }
}

fn load(path: &Path) -> crate::Result<PdfFile> {
    if !path.is_file() {
        return Err(RenderError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    PdfFile::open(path.to_string_lossy().as_ref()).map_err(|e| pdf_error(path, e))
}

fn pdf_error(path: &Path, error: mupdf::error::Error) -> RenderError {
    RenderError::Pdf {
        path: path.to_path_buf(),
        reason: error.to_string(),
    }
}

/// Repack MuPDF's RGB rows (with stride padding) as opaque RGBA.
fn pixmap_to_page(path: &Path, pixmap: &Pixmap) -> crate::Result<PageImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let n = pixmap.n() as usize;
    let stride = pixmap.stride() as usize;
    let row_bytes = width as usize * n;
    if n < 3 || stride < row_bytes {
        return Err(RenderError::Pdf {
            path: path.to_path_buf(),
            reason: format!("unexpected pixmap layout ({n} channels, stride {stride})"),
        });
    }

    let samples = pixmap.samples();
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for row in samples.chunks(stride).take(height as usize) {
        let Some(row) = row.get(..row_bytes) else {
            return Err(RenderError::InvalidDimensions { width, height });
        };
        for px in row.chunks_exact(n) {
            pixels.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
    }
    PageImage::new(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use studyshelf_core::RenderRequest;

    use super::*;
    use crate::document::open_document;
    use crate::renderer::{PageRenderer, RasterPageRenderer};

    /// Write a PDF of blank pages with the given media boxes, with a
    /// correct cross-reference table.
    fn write_pdf(path: &Path, pages: &[(u32, u32)]) {
        let kids: Vec<String> = (0..pages.len()).map(|i| format!("{} 0 R", i + 3)).collect();
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.join(" "),
                pages.len()
            ),
        ];
        for (w, h) in pages {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {w} {h}] >>"
            ));
        }

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref = out.len();
        out.extend_from_slice(
            format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes(),
        );
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        fs::write(path, out).unwrap();
    }

    fn fixture(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("book.pdf");
        write_pdf(&path, &[(200, 100), (50, 80)]);
        path
    }

    #[test]
    fn opens_pages_at_point_size() {
        let path = fixture("studyshelf_test_pdf_open");

        let doc = open_document(&path).unwrap();
        assert_eq!(doc.page_count(), 2);
        let first = doc.page(1).unwrap();
        assert_eq!((first.width, first.height), (200, 100));
        assert_eq!(&first.pixels[..4], &[255, 255, 255, 255]);
        assert!(matches!(
            doc.page(3),
            Err(RenderError::PageOutOfRange { page: 3, count: 2 })
        ));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn renderer_draws_at_the_requested_scale() {
        let path = fixture("studyshelf_test_pdf_scale");
        let doc = PdfDocument::open(&path).unwrap();

        let surface = RasterPageRenderer
            .render(&doc, &RenderRequest::new(2, 1.5).unwrap())
            .unwrap();
        assert_eq!((surface.width, surface.height), (75, 120));

        let err = RasterPageRenderer
            .render(&doc, &RenderRequest::new(1, 1e9).unwrap())
            .unwrap_err();
        assert!(matches!(err, RenderError::Core(_)));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_or_broken_file() {
        let dir = std::env::temp_dir().join("studyshelf_test_pdf_broken");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        assert!(matches!(
            PdfDocument::open(&dir.join("absent.pdf")),
            Err(RenderError::Io { .. })
        ));
        let junk = dir.join("junk.pdf");
        fs::write(&junk, "not a pdf at all").unwrap();
        assert!(PdfDocument::open(&junk).is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
