//! PNG export of a rendered page with embedded metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use crate::error::RenderError;
use crate::surface::RasterSurface;

/// Metadata to embed in an exported page as tEXt chunks.
pub struct ExportMetadata {
    pub document_title: String,
    pub page: u32,
    pub page_count: u32,
    pub scale: f64,
    pub annotated: bool,
}

/// Write a surface as a PNG file with embedded page metadata.
///
/// Uses the `png` crate directly (rather than `image`) to inject custom tEXt
/// chunks.
pub fn export_png(
    surface: &RasterSurface,
    path: &Path,
    metadata: &ExportMetadata,
) -> crate::Result<()> {
    let fail = |reason: String| RenderError::Export {
        path: path.to_path_buf(),
        reason,
    };
    if surface.is_empty() {
        return Err(RenderError::InvalidDimensions {
            width: surface.width,
            height: surface.height,
        });
    }

    let file = std::fs::File::create(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, surface.width, surface.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder
        .add_text_chunk("Software".to_string(), "StudyShelf".to_string())
        .map_err(|e| fail(format!("text chunk: {e}")))?;
    encoder
        .add_text_chunk("Description".to_string(), build_description(metadata))
        .map_err(|e| fail(format!("text chunk: {e}")))?;
    for (key, value) in build_metadata_pairs(metadata) {
        encoder
            .add_text_chunk(key.clone(), value)
            .map_err(|e| fail(format!("text chunk '{key}': {e}")))?;
    }

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| fail(format!("header: {e}")))?;
    png_writer
        .write_image_data(&surface.pixels)
        .map_err(|e| fail(format!("image data: {e}")))?;

    debug!(
        "Exported page {}x{} to {}",
        surface.width,
        surface.height,
        path.display()
    );
    Ok(())
}

fn build_description(meta: &ExportMetadata) -> String {
    format!(
        "{} - Page {} of {}, Zoom {}%",
        meta.document_title,
        meta.page,
        meta.page_count,
        (meta.scale * 100.0).round() as i64
    )
}

fn build_metadata_pairs(meta: &ExportMetadata) -> Vec<(String, String)> {
    vec![
        ("StudyShelf.Document".into(), meta.document_title.clone()),
        ("StudyShelf.Page".into(), meta.page.to_string()),
        ("StudyShelf.PageCount".into(), meta.page_count.to_string()),
        ("StudyShelf.Scale".into(), format!("{}", meta.scale)),
        ("StudyShelf.Annotated".into(), meta.annotated.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ExportMetadata {
        ExportMetadata {
            document_title: "Calculus".into(),
            page: 3,
            page_count: 12,
            scale: 1.2,
            annotated: true,
        }
    }

    #[test]
    fn export_embeds_text_chunks() {
        let surface = RasterSurface::new_page(4, 3);
        let dir = std::env::temp_dir().join("studyshelf_test_export");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("page.png");
        export_png(&surface, &path, &metadata()).expect("export should succeed");

        let decoder = png::Decoder::new(std::fs::File::open(&path).expect("file should exist"));
        let reader = decoder.read_info().expect("should read info");
        let info = reader.info();
        assert_eq!((info.width, info.height), (4, 3));
        let texts: Vec<_> = info.uncompressed_latin1_text.iter().collect();
        assert!(texts
            .iter()
            .any(|t| t.keyword == "Software" && t.text == "StudyShelf"));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "StudyShelf.Page" && t.text == "3"));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "Description" && t.text.contains("Zoom 120%")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_surface_is_rejected() {
        let path = std::env::temp_dir().join("studyshelf_test_export_empty.png");
        assert!(export_png(&RasterSurface::new(0, 0), &path, &metadata()).is_err());
    }
}
