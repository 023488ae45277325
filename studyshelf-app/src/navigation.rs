use std::time::Instant;

use tracing::{info, warn};

use studyshelf_core::{Catalog, Subject};

use crate::app::{section_text, StudyShelfApp};
use crate::app_state::Tab;
use crate::io_worker::IoRequest;
use crate::listing;

impl StudyShelfApp {
    /// Show `tab` and clear every search box.
    ///
    /// The cleared boxes go through the debouncer like typed input, so the
    /// unfiltered lists come back after the quiet period.
    pub(crate) fn switch_tab(&mut self, tab: Tab, now: Instant) {
        if tab != self.tab {
            info!(from = self.tab.label(), to = tab.label(), "Switching section");
        }
        self.tab = tab;
        for search in [
            &mut self.roadmap_search,
            &mut self.book_search,
            &mut self.video_search,
        ] {
            search.typed.push(String::new(), now);
        }
        let text = section_text(self, tab);
        self.say(text);
    }

    pub(crate) fn go_back(&mut self, now: Instant) {
        if self.tab.shows_back() {
            self.switch_tab(Tab::Home, now);
        } else {
            self.say("Already home.");
        }
    }

    pub(crate) fn open_subject_selector(&mut self) {
        self.say(format!(
            "Subjects (current: {}):\n{}",
            self.catalog.subject.key(),
            listing::render_subjects()
        ));
    }

    /// Load a subject and show its roadmap once the data arrives.
    pub(crate) fn select_subject(&mut self, subject: Subject) {
        self.say(format!("Loading {}...", subject.roadmap_title()));
        self.load_subject(subject, true);
    }

    pub(crate) fn load_subject(&mut self, subject: Subject, show_roadmap: bool) {
        let data_dir = self.prefs.data_path();
        info!(%subject, data_dir = %data_dir.display(), "Requesting catalog");
        self.send_io(IoRequest::LoadSubject {
            subject,
            data_dir,
            show_roadmap,
        });
    }

    /// Replace the catalog. The visible lists show everything until the
    /// next search fires.
    pub(crate) fn apply_catalog(&mut self, catalog: Catalog, show_roadmap: bool) {
        self.visible_books = catalog.books.clone();
        self.visible_videos = catalog.videos.clone();
        self.visible_topics = catalog.topics.clone();
        self.catalog = catalog;
        self.catalog_error = None;

        if show_roadmap {
            self.switch_tab(Tab::Roadmap, Instant::now());
        } else {
            let text = section_text(self, self.tab);
            self.say(text);
        }
    }

    /// The roadmap is still shown, with the failure notice in place of
    /// topics. Books and videos keep whatever was loaded before.
    pub(crate) fn catalog_failed(&mut self, subject: Subject, error: String, show_roadmap: bool) {
        warn!(%subject, "Catalog unavailable: {error}");
        self.catalog.subject = subject;
        self.catalog.topics.clear();
        self.visible_topics.clear();
        self.catalog_error = Some(error);

        if show_roadmap {
            self.switch_tab(Tab::Roadmap, Instant::now());
        } else {
            self.say(listing::ROADMAP_LOAD_FAILED);
        }
    }
}
