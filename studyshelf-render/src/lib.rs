pub mod document;
pub mod error;
pub mod export;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod raster;
pub mod renderer;
pub mod session;
pub mod surface;

pub use document::{open_document, Document, ImageDocument, MemoryDocument, PageImage};
pub use error::RenderError;
pub use export::{export_png, ExportMetadata};
#[cfg(feature = "pdf")]
pub use pdf::PdfDocument;
pub use raster::rasterize_page;
pub use renderer::{
    spawn_render_worker, PageRenderer, RasterPageRenderer, RenderJob, RenderOutcome,
};
pub use session::ViewerSession;
pub use surface::RasterSurface;

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
