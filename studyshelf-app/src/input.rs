use std::time::Instant;

use tracing::debug;

use studyshelf_core::{filter_items, filter_roadmap};

use crate::app::{section_text, SearchBox, StudyShelfApp};
use crate::app_state::Tab;

impl StudyShelfApp {
    /// Text typed into the current section's search box. Filtering waits
    /// for the debounce period; later input replaces earlier input.
    pub(crate) fn search_input(&mut self, text: String, now: Instant) {
        let tab = self.tab;
        debug!(tab = tab.label(), query = %text, "Search input");
        match self.search_box_mut(tab) {
            Some(search) => search.typed.push(text, now),
            None => self.say("Nothing to search here. Switch to roadmap, books or videos."),
        }
    }

    fn search_box_mut(&mut self, tab: Tab) -> Option<&mut SearchBox> {
        if !tab.has_search() {
            return None;
        }
        Some(match tab {
            Tab::Roadmap => &mut self.roadmap_search,
            Tab::Books => &mut self.book_search,
            _ => &mut self.video_search,
        })
    }

    /// Apply every search whose quiet period has ended. The active
    /// section is printed again when its query changed.
    pub(crate) fn poll_search(&mut self, now: Instant) {
        if let Some(query) = self.roadmap_search.typed.poll(now) {
            self.visible_topics = filter_roadmap(&query, &self.catalog.topics);
            self.settle_search(Tab::Roadmap, query);
        }
        if let Some(query) = self.book_search.typed.poll(now) {
            self.visible_books = filter_items(&query, &self.catalog.books);
            self.settle_search(Tab::Books, query);
        }
        if let Some(query) = self.video_search.typed.poll(now) {
            self.visible_videos = filter_items(&query, &self.catalog.videos);
            self.settle_search(Tab::Videos, query);
        }
    }

    fn settle_search(&mut self, tab: Tab, query: String) {
        let Some(search) = self.search_box_mut(tab) else {
            return;
        };
        let changed = search.applied != query;
        search.applied = query;
        if changed && tab == self.tab {
            let text = section_text(self, tab);
            self.say(text);
        }
    }

    pub(crate) fn list_current(&mut self) {
        let text = section_text(self, self.tab);
        self.say(text);
    }
}
