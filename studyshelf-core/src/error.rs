use std::path::PathBuf;

use thiserror::Error;

/// Errors originating from the core catalog and viewer state.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid page number: {0} (pages are numbered from 1)")]
    InvalidPageNumber(u32),

    #[error("invalid scale: {0} (must be positive and finite)")]
    InvalidScale(f64),

    #[error("invalid page size: {width}×{height}")]
    InvalidPageSize { width: f64, height: f64 },

    #[error("page too large to render: {width}×{height} pixels (limit {limit})")]
    ViewportTooLarge { width: u32, height: u32, limit: u64 },

    #[error("invalid color {0:?} (expected #rrggbb)")]
    InvalidColor(String),

    #[error("unknown subject {0:?} (expected math, physics or cs)")]
    UnknownSubject(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
