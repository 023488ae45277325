use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use studyshelf_core::PageSize;

use crate::error::RenderError;

/// File extensions accepted as page images.
const PAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

// ---------------------------------------------------------------------------
// Page content
// ---------------------------------------------------------------------------

/// Decoded content of one page at its intrinsic size (RGBA, row-major).
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PageImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> crate::Result<Self> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize * 4 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A page filled with a single colour.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> crate::Result<Self> {
        Self::new(width, height, rgba.repeat(width as usize * height as usize))
    }

    pub fn size(&self) -> PageSize {
        PageSize {
            width: self.width as f64,
            height: self.height as f64,
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A loaded paginated document.
///
/// Pages are numbered from 1. Implementations are shared with the render
/// worker, so fetching a page must be safe from any thread.
pub trait Document: Send + Sync {
    fn page_count(&self) -> u32;

    /// Fetch the content of page `number`.
    fn page(&self, number: u32) -> crate::Result<PageImage>;

    /// Draw page `number` directly at `scale`.
    ///
    /// Formats that can draw at any resolution return `Some`. The default
    /// `None` tells the renderer to resample [`page`](Self::page) instead.
    fn draw_page(&self, _number: u32, _scale: f64) -> crate::Result<Option<PageImage>> {
        Ok(None)
    }

    fn check_page(&self, number: u32) -> crate::Result<()> {
        let count = self.page_count();
        if number == 0 || number > count {
            return Err(RenderError::PageOutOfRange {
                page: number,
                count,
            });
        }
        Ok(())
    }
}

/// Pages held in memory.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    pages: Vec<PageImage>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<PageImage>) -> Self {
        Self { pages }
    }
}

impl Document for MemoryDocument {
    fn page_count(&self) -> u32 {
        page_count_of(self.pages.len())
    }

    fn page(&self, number: u32) -> crate::Result<PageImage> {
        self.check_page(number)?;
        Ok(self.pages[number as usize - 1].clone())
    }
}

/// A book stored as one image file per page.
///
/// Only the file list is read when opening; each page is decoded when it is
/// fetched.
#[derive(Debug, Clone)]
pub struct ImageDocument {
    pages: Vec<PathBuf>,
}

impl ImageDocument {
    /// Open a directory of page images, ordered by file name.
    pub fn open_dir(dir: &Path) -> crate::Result<Self> {
        let entries = fs::read_dir(dir).map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut pages: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_page_image(path))
            .collect();
        if pages.is_empty() {
            return Err(RenderError::EmptyDocument(dir.to_path_buf()));
        }
        pages.sort();

        debug!("Found {} page images in {}", pages.len(), dir.display());
        Ok(Self { pages })
    }

    /// A single image as a one-page document.
    pub fn open_file(path: &Path) -> crate::Result<Self> {
        if !is_page_image(path) {
            return Err(RenderError::UnsupportedFormat(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(RenderError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        Ok(Self {
            pages: vec![path.to_path_buf()],
        })
    }
}

impl Document for ImageDocument {
    fn page_count(&self) -> u32 {
        page_count_of(self.pages.len())
    }

    fn page(&self, number: u32) -> crate::Result<PageImage> {
        self.check_page(number)?;
        let path = &self.pages[number as usize - 1];
        let decoded = image::open(path).map_err(|source| RenderError::Decode {
            path: path.clone(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        PageImage::new(width, height, rgba.into_raw())
    }
}

/// Page numbers are `u32`; pages past `u32::MAX` are unreachable.
pub(crate) fn page_count_of(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

fn is_page_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

#[cfg(feature = "pdf")]
fn open_pdf(path: &Path) -> crate::Result<Arc<dyn Document>> {
    Ok(Arc::new(crate::pdf::PdfDocument::open(path)?))
}

#[cfg(not(feature = "pdf"))]
fn open_pdf(path: &Path) -> crate::Result<Arc<dyn Document>> {
    Err(RenderError::UnsupportedFormat(path.to_path_buf()))
}

/// Open the document at `locator`: a PDF file, a directory of page images
/// or a single page image.
pub fn open_document(locator: &Path) -> crate::Result<Arc<dyn Document>> {
    let document: Arc<dyn Document> = if locator.is_dir() {
        Arc::new(ImageDocument::open_dir(locator)?)
    } else if is_pdf(locator) {
        open_pdf(locator)?
    } else {
        Arc::new(ImageDocument::open_file(locator)?)
    };
    info!(
        pages = document.page_count(),
        "Opened document {}",
        locator.display()
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_document_pages_are_one_indexed() {
        let doc = MemoryDocument::new(vec![
            PageImage::solid(2, 2, [1, 2, 3, 255]).unwrap(),
            PageImage::solid(3, 1, [4, 5, 6, 255]).unwrap(),
        ]);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page(2).unwrap().width, 3);
        assert!(matches!(
            doc.page(0),
            Err(RenderError::PageOutOfRange { page: 0, count: 2 })
        ));
        assert!(doc.page(3).is_err());
    }

    #[test]
    fn page_image_validates_buffer() {
        assert!(PageImage::new(2, 2, vec![0; 15]).is_err());
        assert!(PageImage::new(0, 2, Vec::new()).is_err());
    }

    #[test]
    fn image_document_rejects_pdf() {
        let err = ImageDocument::open_file(Path::new("public/books/calculus.pdf")).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat(_)));
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn pdf_needs_the_pdf_feature() {
        let err = open_document(Path::new("public/books/Calculus.PDF")).err().expect("expected an error");
        assert!(matches!(err, RenderError::UnsupportedFormat(_)));
    }

    #[test]
    fn page_count_saturates() {
        assert_eq!(page_count_of(3), 3);
        assert_eq!(page_count_of(u32::MAX as usize), u32::MAX);
        assert_eq!(page_count_of(usize::MAX), u32::MAX);
    }

    #[test]
    fn image_directory_round_trip() {
        let dir = std::env::temp_dir().join("studyshelf_test_image_document");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        image::RgbaImage::from_pixel(4, 6, image::Rgba([10, 20, 30, 255]))
            .save(dir.join("002.png"))
            .unwrap();
        image::RgbaImage::from_pixel(8, 2, image::Rgba([200, 0, 0, 255]))
            .save(dir.join("001.png"))
            .unwrap();
        fs::write(dir.join("notes.txt"), "not a page").unwrap();

        let doc = open_document(&dir).unwrap();
        assert_eq!(doc.page_count(), 2);
        let first = doc.page(1).unwrap();
        assert_eq!((first.width, first.height), (8, 2));
        assert_eq!(&first.pixels[..4], &[200, 0, 0, 255]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = std::env::temp_dir().join("studyshelf_test_empty_document");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        assert!(matches!(
            open_document(&dir),
            Err(RenderError::EmptyDocument(_))
        ));

        let _ = fs::remove_dir_all(&dir);
    }
}
