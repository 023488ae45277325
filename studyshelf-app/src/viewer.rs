use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use studyshelf_core::Tool;
use studyshelf_render::{export_png, Document, ExportMetadata};

use crate::app::StudyShelfApp;
use crate::app_dir::snapshots_directory;
use crate::io_worker::IoRequest;

const NO_BOOK_OPEN: &str = "No book is open. Use \"open <n>\" from the books section.";

impl StudyShelfApp {
    // -----------------------------------------------------------------------
    // Opening content
    // -----------------------------------------------------------------------

    /// Open the nth book of the visible list. Loading happens off the main
    /// thread; the viewer switches once the document is ready.
    pub(crate) fn open_book(&mut self, n: usize) {
        let Some(book) = n
            .checked_sub(1)
            .and_then(|i| self.visible_books.get(i))
            .cloned() else {
            self.say(format!(
                "No book {n}; {} listed.",
                self.visible_books.len()
            ));
            return;
        };
        let path = self.prefs.content_root().join(&book.file);
        info!(title = %book.title, path = %path.display(), "Opening book");
        self.say(format!("Opening {}...", book.title));
        self.send_io(IoRequest::OpenDocument {
            title: book.title,
            path,
        });
    }

    pub(crate) fn watch_video(&mut self, n: usize) {
        match n.checked_sub(1).and_then(|i| self.visible_videos.get(i)) {
            Some(video) => {
                let line = format!("{}\n  {}", video.title, video.url);
                self.say(line);
            }
            None => self.say(format!(
                "No video {n}; {} listed.",
                self.visible_videos.len()
            )),
        }
    }

    pub(crate) fn document_opened(&mut self, title: String, document: Arc<dyn Document>) {
        let pages = document.page_count();
        self.viewer.open(document);
        self.say(format!("Opened {title} ({pages} pages)."));
        self.viewer_title = Some(title);
    }

    /// The viewer keeps whatever it was showing.
    pub(crate) fn document_failed(&mut self, title: String, error: String) {
        warn!(%title, "Book failed to open: {error}");
        self.say(format!(
            "! Error loading book. Please try again. ({title}: {error})"
        ));
    }

    pub(crate) fn close_viewer(&mut self) {
        if self.viewer.is_open() {
            self.viewer.close();
            self.viewer_title = None;
            self.say("Viewer closed.");
        } else {
            self.say(NO_BOOK_OPEN);
        }
    }

    // -----------------------------------------------------------------------
    // Page and zoom controls
    // -----------------------------------------------------------------------

    fn require_open(&mut self) -> bool {
        if !self.viewer.is_open() {
            self.say(NO_BOOK_OPEN);
        }
        self.viewer.is_open()
    }

    pub(crate) fn viewer_next(&mut self) {
        if self.require_open() && !self.viewer.next_page() {
            self.say("Already on the last page.");
        }
    }

    pub(crate) fn viewer_prev(&mut self) {
        if self.require_open() && !self.viewer.prev_page() {
            self.say("Already on the first page.");
        }
    }

    pub(crate) fn viewer_zoom_in(&mut self) {
        if self.require_open() {
            self.viewer.zoom_in();
        }
    }

    pub(crate) fn viewer_zoom_out(&mut self) {
        if self.require_open() && !self.viewer.zoom_out() {
            self.say(format!(
                "Already at minimum zoom ({}).",
                self.viewer.zoom_label()
            ));
        }
    }

    pub(crate) fn viewer_tool(&mut self, tool: Tool) {
        self.viewer.set_tool(tool);
        self.say(format!("Tool: {}", tool.label()));
    }

    /// Handle finished renders. A line is printed once the viewer has
    /// caught up with the latest request.
    pub(crate) fn poll_viewer(&mut self) {
        let (_, failed_before) = self.viewer.render_stats();
        if self.viewer.poll_responses() == 0 {
            return;
        }
        let (_, failed_after) = self.viewer.render_stats();
        if failed_after > failed_before {
            self.say("! A page failed to render.");
        }
        if self.viewer.is_rendering() {
            return;
        }
        if let (Some(page), Some(surface)) = (self.viewer.page_label(), self.viewer.page_surface()) {
            let line = format!(
                "Page {}/{} at {} ({}x{} px)",
                page,
                self.viewer.page_count(),
                self.viewer.zoom_label(),
                surface.width,
                surface.height
            );
            self.say(line);
        }
    }

    // -----------------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------------

    /// Save the displayed page with its annotations as a PNG.
    pub(crate) fn snapshot(&mut self, path: Option<PathBuf>) {
        let Some(title) = self.viewer_title.clone() else {
            self.say(NO_BOOK_OPEN);
            return;
        };
        let Some(image) = self.viewer.composite() else {
            self.say("Nothing rendered yet.");
            return;
        };
        let page = self.viewer.page_label().unwrap_or(self.viewer.page_num());
        let path = path.unwrap_or_else(|| {
            snapshots_directory().join(format!("{}-p{page}.png", file_stem(&title)))
        });
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!("Failed to create snapshot directory: {e}");
                self.say(format!("! Could not save snapshot: {e}"));
                return;
            }
        }

        let annotated = self
            .viewer
            .annotation_surface()
            .pixels
            .chunks_exact(4)
            .any(|px| px[3] != 0);
        let metadata = ExportMetadata {
            document_title: title,
            page,
            page_count: self.viewer.page_count(),
            scale: self.viewer.scale(),
            annotated,
        };
        match export_png(&image, &path, &metadata) {
            Ok(()) => self.say(format!("Saved {}", path.display())),
            Err(e) => {
                error!("Snapshot failed: {e}");
                self.say(format!("! Could not save snapshot: {e}"));
            }
        }
    }
}

/// Lowercase ASCII alphanumerics with runs of anything else collapsed to `-`.
fn file_stem(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "page".to_string()
    } else {
        trimmed.to_string()
    }
}
