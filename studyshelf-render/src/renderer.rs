use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use studyshelf_core::{PageViewport, RenderRequest};

use crate::document::Document;
use crate::error::RenderError;
use crate::raster::rasterize_page;
use crate::surface::RasterSurface;

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Produces the raster image of one page at one scale.
pub trait PageRenderer: Send + 'static {
    fn render(&self, document: &dyn Document, request: &RenderRequest)
        -> crate::Result<RasterSurface>;
}

/// Fetches the page from the document and rasterizes it at the requested
/// scale.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterPageRenderer;

impl PageRenderer for RasterPageRenderer {
    fn render(
        &self,
        document: &dyn Document,
        request: &RenderRequest,
    ) -> crate::Result<RasterSurface> {
        // Pages drawn at the target scale are only copied onto white.
        let (page, scale) = match document.draw_page(request.page, request.scale)? {
            Some(drawn) => (drawn, 1.0),
            None => (document.page(request.page)?, request.scale),
        };
        let viewport = PageViewport::new(page.size(), scale)?;
        debug!(
            page = request.page,
            scale = request.scale,
            width = viewport.width,
            height = viewport.height,
            "Rasterizing page"
        );
        Ok(rasterize_page(&page, &viewport))
    }
}

// ---------------------------------------------------------------------------
// Worker thread communication
// ---------------------------------------------------------------------------

/// A render handed to the worker thread.
pub struct RenderJob {
    /// Identifies the document the job belongs to.
    pub generation: u64,
    pub request: RenderRequest,
    pub document: Arc<dyn Document>,
}

/// The worker's answer to one [`RenderJob`].
pub struct RenderOutcome {
    pub generation: u64,
    pub request: RenderRequest,
    pub result: crate::Result<RasterSurface>,
    pub elapsed: Duration,
}

/// Spawn a dedicated render thread driving `renderer`.
///
/// Returns the send-side for jobs and the receive-side for outcomes. Every
/// job produces exactly one outcome, success or failure. The thread runs
/// until the job sender is dropped.
pub fn spawn_render_worker<R: PageRenderer>(
    renderer: R,
) -> crate::Result<(mpsc::Sender<RenderJob>, mpsc::Receiver<RenderOutcome>)> {
    let (job_tx, job_rx) = mpsc::channel::<RenderJob>();
    let (outcome_tx, outcome_rx) = mpsc::channel::<RenderOutcome>();

    std::thread::Builder::new()
        .name("render-worker".into())
        .spawn(move || {
            debug!("Render worker thread started");
            while let Ok(job) = job_rx.recv() {
                let start = Instant::now();
                let result = renderer.render(job.document.as_ref(), &job.request);
                let elapsed = start.elapsed();
                debug!(
                    page = job.request.page,
                    elapsed_ms = elapsed.as_millis(),
                    ok = result.is_ok(),
                    "Render finished"
                );
                let outcome = RenderOutcome {
                    generation: job.generation,
                    request: job.request,
                    result,
                    elapsed,
                };
                if outcome_tx.send(outcome).is_err() {
                    break;
                }
            }
            info!("Render worker thread exiting");
        })
        .map_err(RenderError::WorkerSpawn)?;

    Ok((job_tx, outcome_rx))
}
