pub mod annotation;
pub mod catalog;
pub mod coalescer;
pub mod debounce;
pub mod error;
pub mod page;
pub mod search;
pub mod zoom;

// Re-export primary types for convenience.
pub use annotation::{AnnotationState, BlendMode, Point, Rgb, Segment, StrokeStyle, Tool};
pub use catalog::{Book, Catalog, SubTopic, Subject, Topic, Video};
pub use coalescer::{Dispatch, RenderCoalescer, RenderRequest};
pub use debounce::Debouncer;
pub use error::CoreError;
pub use page::{PageSize, PageViewport, MAX_VIEWPORT_PIXELS};
pub use search::{filter_items, filter_roadmap, Searchable};
pub use zoom::Zoom;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
