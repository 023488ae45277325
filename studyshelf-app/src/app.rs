use std::sync::mpsc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use studyshelf_core::{Book, Catalog, Debouncer, Topic, Video};
use studyshelf_render::{RasterPageRenderer, RenderError, ViewerSession};

use crate::app_state::Tab;
use crate::commands::{Command, HELP};
use crate::io_worker::{spawn_io_worker, IoRequest, IoResponse};
use crate::listing;
use crate::preferences::AppPreferences;

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error("failed to start I/O worker: {0}")]
    IoWorker(#[from] std::io::Error),

    #[error(transparent)]
    Viewer(#[from] RenderError),
}

// ---------------------------------------------------------------------------
// Search boxes
// ---------------------------------------------------------------------------

/// One search input: the text last applied, and the debounced text typed
/// since.
pub(crate) struct SearchBox {
    pub(crate) applied: String,
    pub(crate) typed: Debouncer<String>,
}

impl SearchBox {
    fn new(prefs: &AppPreferences) -> Self {
        Self {
            applied: String::new(),
            typed: Debouncer::new(prefs.search_debounce()),
        }
    }
}

// ---------------------------------------------------------------------------
// Application struct
// ---------------------------------------------------------------------------

pub(crate) struct StudyShelfApp {
    pub(crate) prefs: AppPreferences,

    // Section state
    pub(crate) tab: Tab,
    pub(crate) catalog: Catalog,
    pub(crate) catalog_error: Option<String>,
    pub(crate) visible_books: Vec<Book>,
    pub(crate) visible_videos: Vec<Video>,
    pub(crate) visible_topics: Vec<Topic>,
    pub(crate) roadmap_search: SearchBox,
    pub(crate) book_search: SearchBox,
    pub(crate) video_search: SearchBox,

    // Book viewer
    pub(crate) viewer: ViewerSession,
    pub(crate) viewer_title: Option<String>,

    // Background I/O
    pub(crate) tx_io: mpsc::Sender<IoRequest>,
    pub(crate) rx_io: mpsc::Receiver<IoResponse>,
    pub(crate) io_in_flight: usize,

    output: Vec<String>,
}

impl StudyShelfApp {
    pub(crate) fn new(prefs: AppPreferences) -> Result<Self, StartupError> {
        let (tx_io, rx_io) = spawn_io_worker()?;
        let mut viewer = ViewerSession::new(RasterPageRenderer, prefs.zoom())?;
        viewer.set_pen_color(prefs.pen_color);
        viewer.set_pen_size(prefs.pen_size);

        let mut app = Self {
            tab: Tab::default(),
            catalog: Catalog::default(),
            catalog_error: None,
            visible_books: Vec::new(),
            visible_videos: Vec::new(),
            visible_topics: Vec::new(),
            roadmap_search: SearchBox::new(&prefs),
            book_search: SearchBox::new(&prefs),
            video_search: SearchBox::new(&prefs),
            viewer,
            viewer_title: None,
            tx_io,
            rx_io,
            io_in_flight: 0,
            output: Vec::new(),
            prefs,
        };

        let subject = app.prefs.default_subject;
        app.load_subject(subject, false);
        Ok(app)
    }

    /// Queue a line for the user.
    pub(crate) fn say(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    pub(crate) fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub(crate) fn send_io(&mut self, request: IoRequest) {
        if self.tx_io.send(request).is_ok() {
            self.io_in_flight += 1;
        } else {
            self.say("! Background loader is not running.");
        }
    }

    /// Nothing is loading, rendering or waiting on a debounce.
    pub(crate) fn is_idle(&self) -> bool {
        self.io_in_flight == 0
            && !self.viewer.is_rendering()
            && !self.roadmap_search.typed.is_pending()
            && !self.book_search.typed.is_pending()
            && !self.video_search.typed.is_pending()
    }

    // -----------------------------------------------------------------------
    // Event loop hooks
    // -----------------------------------------------------------------------

    pub(crate) fn execute(&mut self, command: Command, now: Instant) {
        debug!(?command, "Executing");
        match command {
            Command::Nothing | Command::Quit => {}
            Command::Tab(tab) => self.switch_tab(tab, now),
            Command::Back => self.go_back(now),
            Command::Subjects => self.open_subject_selector(),
            Command::Subject(subject) => self.select_subject(subject),
            Command::Search(text) => self.search_input(text, now),
            Command::List => self.list_current(),
            Command::Open(n) => self.open_book(n),
            Command::Watch(n) => self.watch_video(n),
            Command::NextPage => self.viewer_next(),
            Command::PrevPage => self.viewer_prev(),
            Command::ZoomIn => self.viewer_zoom_in(),
            Command::ZoomOut => self.viewer_zoom_out(),
            Command::Tool(tool) => self.viewer_tool(tool),
            Command::PenColor(color) => self.viewer.set_pen_color(color),
            Command::PenSize(size) => self.viewer.set_pen_size(size),
            Command::PointerDown(x, y) => self.viewer.pointer_down(x, y),
            Command::PointerMove(x, y) => self.viewer.pointer_move(x, y),
            Command::PointerUp => self.viewer.pointer_up(),
            Command::ClearAnnotations => self.viewer.clear_annotations(),
            Command::Snapshot(path) => self.snapshot(path),
            Command::Close => self.close_viewer(),
            Command::Status => self.status(),
            Command::Help => self.say(HELP),
        }
    }

    /// Process everything that finished since the last tick.
    pub(crate) fn tick(&mut self, now: Instant) {
        self.poll_io();
        self.poll_search(now);
        self.poll_viewer();
    }

    fn poll_io(&mut self) {
        while let Ok(response) = self.rx_io.try_recv() {
            self.io_in_flight = self.io_in_flight.saturating_sub(1);
            match response {
                IoResponse::CatalogLoaded {
                    catalog,
                    show_roadmap,
                } => self.apply_catalog(catalog, show_roadmap),
                IoResponse::CatalogFailed {
                    subject,
                    error,
                    show_roadmap,
                } => self.catalog_failed(subject, error, show_roadmap),
                IoResponse::DocumentOpened { title, document } => {
                    self.document_opened(title, document)
                }
                IoResponse::DocumentFailed { title, error } => self.document_failed(title, error),
            }
        }
    }

    fn status(&mut self) {
        let mut lines = vec![format!(
            "Section: {} | Subject: {} | {} books, {} videos, {} topics",
            self.tab.label(),
            self.catalog.subject,
            self.catalog.books.len(),
            self.catalog.videos.len(),
            self.catalog.topics.len()
        )];
        if let Some(title) = &self.viewer_title {
            lines.push(format!(
                "Viewer: {} page {}/{} at {} | tool {}",
                title,
                self.viewer.page_num(),
                self.viewer.page_count(),
                self.viewer.zoom_label(),
                self.viewer.tool().label()
            ));
        }
        if self.tab.shows_back() {
            lines.push("(\"back\" returns home)".to_string());
        }
        for line in lines {
            self.say(line);
        }
    }

    pub(crate) fn shutdown(&mut self) {
        self.viewer.close();
        info!("StudyShelf shutting down");
    }
}

/// Render the listing for a section.
pub(crate) fn section_text(app: &StudyShelfApp, tab: Tab) -> String {
    match tab {
        Tab::Home => format!(
            "StudyShelf - {} books, {} videos. Type \"subjects\" to pick a roadmap or \"help\".",
            app.catalog.books.len(),
            app.catalog.videos.len()
        ),
        Tab::Roadmap => match &app.catalog_error {
            Some(_) => listing::ROADMAP_LOAD_FAILED.to_string(),
            None => listing::render_roadmap(app.catalog.subject, &app.visible_topics),
        },
        Tab::Books => listing::render_books(&app.visible_books),
        Tab::Videos => listing::render_videos(&app.visible_videos),
    }
}
