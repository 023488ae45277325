use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use studyshelf_core::{
    AnnotationState, Dispatch, Point, RenderCoalescer, RenderRequest, Rgb, Tool, Zoom,
};

use crate::document::Document;
use crate::renderer::{spawn_render_worker, PageRenderer, RenderJob, RenderOutcome};
use crate::surface::RasterSurface;

/// One book viewer: the open document, the current page and zoom, the
/// render coalescer and the surfaces the page and its annotations live on.
///
/// All state is owned here and mutated from the thread that owns the
/// session. Renders run on a worker thread; their outcomes are picked up
/// by [`poll_responses`](Self::poll_responses), so a completion is always
/// handled in full before the next one is looked at.
pub struct ViewerSession {
    document: Option<Arc<dyn Document>>,
    /// Bumped on every open/close so outcomes for an older document are
    /// recognised and dropped.
    generation: u64,
    page_num: u32,
    zoom: Zoom,
    coalescer: RenderCoalescer,

    tx_job: mpsc::Sender<RenderJob>,
    rx_outcome: mpsc::Receiver<RenderOutcome>,

    page_surface: Option<RasterSurface>,
    annotation_surface: RasterSurface,
    annotation: AnnotationState,
    /// Page number shown next to the navigation buttons.
    page_label: Option<u32>,

    renders_completed: u64,
    render_failures: u64,
}

impl ViewerSession {
    /// Create a session backed by a fresh render worker running `renderer`.
    pub fn new<R: PageRenderer>(renderer: R, zoom: Zoom) -> crate::Result<Self> {
        let (tx_job, rx_outcome) = spawn_render_worker(renderer)?;
        Ok(Self::with_channels(tx_job, rx_outcome, zoom))
    }

    /// Create a session on top of existing worker channels.
    pub fn with_channels(
        tx_job: mpsc::Sender<RenderJob>,
        rx_outcome: mpsc::Receiver<RenderOutcome>,
        zoom: Zoom,
    ) -> Self {
        Self {
            document: None,
            generation: 0,
            page_num: 1,
            zoom,
            coalescer: RenderCoalescer::new(),
            tx_job,
            rx_outcome,
            page_surface: None,
            annotation_surface: RasterSurface::new(0, 0),
            annotation: AnnotationState::default(),
            page_label: None,
            renders_completed: 0,
            render_failures: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Document lifecycle
    // -----------------------------------------------------------------------

    /// Replace the open document and render its first page.
    ///
    /// Page, zoom, annotations and the coalescer are reset regardless of
    /// what the previous document was doing.
    pub fn open(&mut self, document: Arc<dyn Document>) {
        self.generation += 1;
        info!(
            generation = self.generation,
            pages = document.page_count(),
            "Opening document"
        );
        self.document = Some(document);
        self.page_num = 1;
        self.zoom.reset();
        self.coalescer.reset();
        self.page_surface = None;
        self.annotation_surface.clear();
        self.annotation.stop();
        self.request_render(self.page_num);
    }

    pub fn close(&mut self) {
        if self.document.take().is_some() {
            self.generation += 1;
            self.coalescer.reset();
            self.page_surface = None;
            self.annotation_surface.resize(0, 0);
            self.page_label = None;
            info!("Viewer closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    pub fn page_count(&self) -> u32 {
        self.document.as_ref().map_or(0, |d| d.page_count())
    }

    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    pub fn scale(&self) -> f64 {
        self.zoom.scale()
    }

    pub fn zoom_label(&self) -> String {
        self.zoom.label()
    }

    pub fn page_label(&self) -> Option<u32> {
        self.page_label
    }

    pub fn coalescer(&self) -> &RenderCoalescer {
        &self.coalescer
    }

    pub fn is_rendering(&self) -> bool {
        self.coalescer.is_busy()
    }

    /// The most recently rendered page.
    pub fn page_surface(&self) -> Option<&RasterSurface> {
        self.page_surface.as_ref()
    }

    pub fn annotation_surface(&self) -> &RasterSurface {
        &self.annotation_surface
    }

    /// `(completed, failed)` render counts since the session was created.
    pub fn render_stats(&self) -> (u64, u64) {
        (self.renders_completed, self.render_failures)
    }

    // -----------------------------------------------------------------------
    // Navigation and zoom
    // -----------------------------------------------------------------------

    pub fn next_page(&mut self) -> bool {
        if !self.is_open() || self.page_num >= self.page_count() {
            return false;
        }
        self.page_num += 1;
        self.request_render(self.page_num);
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if !self.is_open() || self.page_num <= 1 {
            return false;
        }
        self.page_num -= 1;
        self.request_render(self.page_num);
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        self.zoom.zoom_in();
        self.request_render(self.page_num);
        true
    }

    /// Zoom out one step; a no-op at the minimum scale.
    pub fn zoom_out(&mut self) -> bool {
        if !self.is_open() || !self.zoom.zoom_out() {
            return false;
        }
        self.request_render(self.page_num);
        true
    }

    // -----------------------------------------------------------------------
    // Render dispatch & polling
    // -----------------------------------------------------------------------

    /// Ask for `page` to be rendered at the current scale.
    ///
    /// Starts immediately when idle; otherwise the request waits in the
    /// coalescer's single pending slot.
    pub fn request_render(&mut self, page: u32) {
        if self.document.is_none() {
            return;
        }
        let request = match RenderRequest::new(page, self.zoom.scale()) {
            Ok(r) => r,
            Err(e) => {
                warn!("Ignoring render request: {e}");
                return;
            }
        };
        if let Dispatch::Start(request) = self.coalescer.request(request) {
            self.dispatch(request);
        }
    }

    fn dispatch(&mut self, mut request: RenderRequest) {
        let Some(document) = self.document.clone() else {
            self.coalescer.reset();
            return;
        };
        loop {
            self.page_label = Some(request.page);
            debug!(
                generation = self.generation,
                page = request.page,
                scale = request.scale,
                "Dispatching render"
            );
            let job = RenderJob {
                generation: self.generation,
                request,
                document: Arc::clone(&document),
            };
            if self.tx_job.send(job).is_ok() {
                return;
            }
            error!(page = request.page, "Render worker is gone");
            self.render_failures += 1;
            match self.coalescer.complete() {
                Some(next) => request = next,
                None => return,
            }
        }
    }

    /// Handle every render that has finished. Returns how many outcomes
    /// belonging to the open document were processed.
    pub fn poll_responses(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.rx_outcome.try_recv() {
                Ok(outcome) => {
                    if self.handle_outcome(outcome) {
                        handled += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.worker_lost() {
                        handled += 1;
                    }
                    break;
                }
            }
        }
        handled
    }

    /// Block up to `timeout` for the next outcome of the open document.
    /// Returns `false` on timeout or if the worker is gone.
    pub fn wait_for_render(&mut self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.rx_outcome.recv_timeout(remaining) {
                Ok(outcome) => {
                    if self.handle_outcome(outcome) {
                        return true;
                    }
                }
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => {
                    self.worker_lost();
                    return false;
                }
            }
        }
    }

    /// Wait until the coalescer is idle, handling outcomes as they arrive.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while self.coalescer.is_busy() {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() || !self.wait_for_render(remaining) {
                return !self.coalescer.is_busy();
            }
        }
        true
    }

    /// The worker hung up, so the render in flight will never report back.
    /// Count it as failed and drop the pending request; later requests
    /// fail fast in `dispatch`. Returns whether a render was in flight.
    fn worker_lost(&mut self) -> bool {
        if !self.coalescer.is_busy() {
            return false;
        }
        error!(page = ?self.page_label, "Render worker disconnected mid-render");
        self.render_failures += 1;
        self.coalescer.reset();
        true
    }

    fn handle_outcome(&mut self, outcome: RenderOutcome) -> bool {
        if outcome.generation != self.generation {
            debug!(
                stale = outcome.generation,
                current = self.generation,
                "Dropping render for a previous document"
            );
            return false;
        }

        match outcome.result {
            Ok(surface) => {
                info!(
                    page = outcome.request.page,
                    width = surface.width,
                    height = surface.height,
                    elapsed_ms = outcome.elapsed.as_millis(),
                    "Page rendered"
                );
                self.annotation_surface.resize(surface.width, surface.height);
                self.page_surface = Some(surface);
                self.renders_completed += 1;
            }
            Err(e) => {
                warn!(page = outcome.request.page, "Error rendering page: {e}");
                self.render_failures += 1;
            }
        }

        if let Some(next) = self.coalescer.complete() {
            self.dispatch(next);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Annotations
    // -----------------------------------------------------------------------

    pub fn tool(&self) -> Tool {
        self.annotation.tool()
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.annotation.set_tool(tool);
    }

    pub fn set_pen_color(&mut self, color: Rgb) {
        self.annotation.set_pen_color(color);
    }

    pub fn set_pen_size(&mut self, size: f32) {
        self.annotation.set_pen_size(size);
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.annotation.start(Point::new(x, y));
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some(segment) = self.annotation.draw_to(Point::new(x, y)) {
            self.annotation_surface.draw_segment(&segment);
        }
    }

    pub fn pointer_up(&mut self) {
        self.annotation.stop();
    }

    pub fn clear_annotations(&mut self) {
        self.annotation_surface.clear();
    }

    /// The rendered page with annotations blended on top.
    pub fn composite(&self) -> Option<RasterSurface> {
        let mut out = self.page_surface.clone()?;
        if let Err(e) = out.composite_over(&self.annotation_surface) {
            warn!("Annotation layer out of sync with page: {e}");
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MemoryDocument, PageImage};

    fn document(pages: u32) -> Arc<dyn Document> {
        let pages = (0..pages)
            .map(|_| PageImage::solid(20, 10, [0, 0, 0, 255]).unwrap())
            .collect();
        Arc::new(MemoryDocument::new(pages))
    }

    /// A session whose jobs are collected instead of rendered, so the test
    /// decides when each render finishes.
    fn manual_session() -> (
        ViewerSession,
        mpsc::Receiver<RenderJob>,
        mpsc::Sender<RenderOutcome>,
    ) {
        let (tx_job, rx_job) = mpsc::channel();
        let (tx_outcome, rx_outcome) = mpsc::channel();
        let session = ViewerSession::with_channels(tx_job, rx_outcome, Zoom::default());
        (session, rx_job, tx_outcome)
    }

    fn finish(job: &RenderJob, ok: bool) -> RenderOutcome {
        let result = if ok {
            Ok(RasterSurface::new_page(20, 10))
        } else {
            Err(crate::RenderError::WorkerDisconnected)
        };
        RenderOutcome {
            generation: job.generation,
            request: job.request,
            result,
            elapsed: Duration::ZERO,
        }
    }

    fn pages(jobs: &mpsc::Receiver<RenderJob>) -> Vec<u32> {
        jobs.try_iter().map(|j| j.request.page).collect()
    }

    #[test]
    fn open_renders_first_page() {
        let (mut s, jobs, _) = manual_session();
        s.open(document(3));
        assert_eq!(pages(&jobs), vec![1]);
        assert!(s.is_rendering());
        assert_eq!(s.page_label(), Some(1));
    }

    #[test]
    fn rapid_navigation_coalesces() {
        let (mut s, jobs, outcomes) = manual_session();
        s.open(document(10));
        let first = jobs.try_recv().unwrap();

        s.next_page();
        s.next_page();
        s.next_page();
        assert!(jobs.try_recv().is_err(), "nothing dispatched while busy");
        assert_eq!(s.coalescer().pending().map(|r| r.page), Some(4));

        outcomes.send(finish(&first, true)).unwrap();
        assert_eq!(s.poll_responses(), 1);
        assert_eq!(pages(&jobs), vec![4]);
        assert_eq!(s.coalescer().pending(), None);
    }

    #[test]
    fn failure_still_unblocks() {
        let (mut s, jobs, outcomes) = manual_session();
        s.open(document(5));
        let first = jobs.try_recv().unwrap();
        s.next_page();

        outcomes.send(finish(&first, false)).unwrap();
        s.poll_responses();
        let second = jobs.try_recv().unwrap();
        assert_eq!(second.request.page, 2);
        assert_eq!(s.render_stats(), (0, 1));

        outcomes.send(finish(&second, true)).unwrap();
        s.poll_responses();
        assert!(!s.is_rendering());
        assert_eq!(s.render_stats(), (1, 1));
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let (mut s, _jobs, _) = manual_session();
        assert!(!s.next_page(), "nothing open");
        s.open(document(2));
        assert!(!s.prev_page());
        assert!(s.next_page());
        assert!(!s.next_page());
        assert_eq!(s.page_num(), 2);
    }

    #[test]
    fn zoom_rerenders_with_new_scale() {
        let (mut s, jobs, outcomes) = manual_session();
        s.open(document(1));
        let first = jobs.try_recv().unwrap();
        s.zoom_in();
        outcomes.send(finish(&first, true)).unwrap();
        s.poll_responses();

        let job = jobs.try_recv().unwrap();
        assert_eq!(job.request.scale, 1.2);
        assert_eq!(s.zoom_label(), "120%");
    }

    #[test]
    fn zoom_out_floor_is_noop() {
        let (mut s, jobs, outcomes) = manual_session();
        s.open(document(1));
        let mut job = jobs.try_recv().unwrap();
        for _ in 0..3 {
            assert!(s.zoom_out());
            outcomes.send(finish(&job, true)).unwrap();
            s.poll_responses();
            job = jobs.try_recv().unwrap();
        }
        assert_eq!(s.scale(), 0.4);
        assert!(!s.zoom_out());
        assert_eq!(s.scale(), 0.4);
        assert_eq!(s.coalescer().pending(), None, "no render queued");
    }

    #[test]
    fn reopen_resets_coalescer_and_drops_stale_outcomes() {
        let (mut s, jobs, outcomes) = manual_session();
        s.open(document(5));
        let old = jobs.try_recv().unwrap();
        s.next_page();
        s.zoom_in();

        s.open(document(2));
        assert_eq!(s.page_num(), 1);
        assert_eq!(s.scale(), 1.0);
        let fresh = jobs.try_recv().unwrap();
        assert_eq!(fresh.request.page, 1);
        assert_eq!(s.coalescer().pending(), None);

        outcomes.send(finish(&old, true)).unwrap();
        assert_eq!(s.poll_responses(), 0);
        assert!(s.is_rendering(), "stale outcome must not unblock the new render");

        outcomes.send(finish(&fresh, true)).unwrap();
        assert_eq!(s.poll_responses(), 1);
        assert!(!s.is_rendering());
    }

    #[test]
    fn dead_worker_does_not_leave_session_busy() {
        let (mut s, jobs, _) = manual_session();
        drop(jobs);
        s.open(document(3));
        assert!(!s.is_rendering());
        assert_eq!(s.page_label(), Some(1));
        assert_eq!(s.render_stats(), (0, 1));
    }

    #[test]
    fn worker_dying_mid_render_unblocks_session() {
        let (mut s, jobs, outcomes) = manual_session();
        s.open(document(3));
        let _in_flight = jobs.try_recv().unwrap();
        s.next_page();
        assert!(s.is_rendering());

        // A panicking worker drops both of its channel ends.
        drop(outcomes);
        drop(jobs);
        assert_eq!(s.poll_responses(), 1);
        assert!(!s.is_rendering());
        assert_eq!(s.coalescer().pending(), None);
        assert_eq!(s.render_stats(), (0, 1));

        assert!(s.next_page());
        assert!(!s.is_rendering(), "new requests fail fast");
        assert!(s.wait_until_idle(Duration::from_millis(10)));
        assert_eq!(s.render_stats(), (0, 2));
    }

    #[test]
    fn wait_for_render_notices_dead_worker() {
        let (mut s, jobs, outcomes) = manual_session();
        s.open(document(1));
        drop(outcomes);
        drop(jobs);
        assert!(!s.wait_for_render(Duration::from_secs(1)));
        assert!(!s.is_rendering());
    }

    #[test]
    fn annotations_follow_page_size_and_composite() {
        let (mut s, jobs, outcomes) = manual_session();
        s.open(document(1));
        outcomes.send(finish(&jobs.try_recv().unwrap(), true)).unwrap();
        s.poll_responses();
        assert_eq!(s.annotation_surface().width, 20);

        s.set_pen_color("#ff0000".parse().unwrap());
        s.set_tool(Tool::Pen);
        s.pointer_down(0.0, 5.0);
        s.pointer_move(20.0, 5.0);
        s.pointer_up();

        let composite = s.composite().unwrap();
        assert_eq!(composite.pixel(10, 5), Some([255, 0, 0, 255]));
        assert_eq!(composite.pixel(10, 0), Some([255, 255, 255, 255]));

        s.clear_annotations();
        assert_eq!(s.composite().unwrap().pixel(10, 5), Some([255, 255, 255, 255]));
    }

    #[test]
    fn close_discards_document() {
        let (mut s, jobs, outcomes) = manual_session();
        s.open(document(2));
        let job = jobs.try_recv().unwrap();
        s.close();
        assert!(!s.is_open());
        assert!(!s.is_rendering());

        outcomes.send(finish(&job, true)).unwrap();
        assert_eq!(s.poll_responses(), 0);
        assert!(s.page_surface().is_none());
    }
}
