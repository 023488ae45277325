use std::path::PathBuf;

use thiserror::Error;

/// Errors originating from documents and the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: u32, count: u32 },

    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("document {} has no pages", .0.display())]
    EmptyDocument(PathBuf),

    #[error("unsupported document {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read PDF {}: {reason}", path.display())]
    Pdf { path: PathBuf, reason: String },

    #[error("failed to export {}: {reason}", path.display())]
    Export { path: PathBuf, reason: String },

    #[error("failed to spawn render worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("render worker disconnected")]
    WorkerDisconnected,

    #[error(transparent)]
    Core(#[from] studyshelf_core::CoreError),
}
