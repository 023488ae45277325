use tracing::debug;

use crate::error::CoreError;

/// A single page-render request: which page, at which zoom scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    /// 1-indexed page number.
    pub page: u32,
    /// Pixels per intrinsic page unit.
    pub scale: f64,
}

impl RenderRequest {
    /// Create a validated request.
    pub fn new(page: u32, scale: f64) -> crate::Result<Self> {
        if page == 0 {
            return Err(CoreError::InvalidPageNumber(page));
        }
        if scale <= 0.0 || !scale.is_finite() {
            return Err(CoreError::InvalidScale(scale));
        }
        Ok(Self { page, scale })
    }
}

/// What the caller must do after handing a request to the coalescer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    /// The coalescer was idle and is now busy: start rendering this request.
    Start(RenderRequest),
    /// A render is already in flight; the request was parked in the pending
    /// slot. `superseded` is the earlier pending request it replaced, if any.
    Deferred { superseded: Option<RenderRequest> },
}

/// Keeps at most one page render in flight.
///
/// Requests arriving while a render is outstanding are not queued: the
/// single pending slot is overwritten, so a burst of navigation or zoom
/// events collapses to the render already running plus the latest request.
/// Same-page requests are not deduplicated.
///
/// The coalescer is plain state; it never blocks and never starts work
/// itself. The owner acts on the returned [`Dispatch`] and reports
/// completion through [`complete`](Self::complete).
#[derive(Debug, Default)]
pub struct RenderCoalescer {
    busy: bool,
    pending: Option<RenderRequest>,
}

impl RenderCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a render is currently outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The request waiting for the in-flight render to finish.
    pub fn pending(&self) -> Option<RenderRequest> {
        self.pending
    }

    /// Submit a request.
    pub fn request(&mut self, request: RenderRequest) -> Dispatch {
        if self.busy {
            let superseded = self.pending.replace(request);
            debug!(
                page = request.page,
                superseded = superseded.map(|r| r.page),
                "Render busy, request deferred"
            );
            Dispatch::Deferred { superseded }
        } else {
            self.busy = true;
            Dispatch::Start(request)
        }
    }

    /// Report that the in-flight render finished, successfully or not.
    ///
    /// Returns the pending request that must be started now. In that case
    /// the pending slot is already cleared and the coalescer is busy again.
    pub fn complete(&mut self) -> Option<RenderRequest> {
        self.busy = false;
        let next = self.pending.take()?;
        match self.request(next) {
            Dispatch::Start(request) => Some(request),
            Dispatch::Deferred { .. } => None,
        }
    }

    /// Return to the idle state, forgetting any pending request.
    pub fn reset(&mut self) {
        self.busy = false;
        self.pending = None;
    }
}
