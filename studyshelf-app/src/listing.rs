//! Plain-text rendering of the catalog sections.

use std::fmt::Write;

use studyshelf_core::{Book, Subject, Topic, Video};

pub(crate) const ROADMAP_LOAD_FAILED: &str = "Failed to load content. Please try again later.";

pub(crate) fn render_books(books: &[Book]) -> String {
    if books.is_empty() {
        return "No books found matching your search.".to_string();
    }
    let mut out = String::new();
    for (i, book) in books.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {} by {} [{}]",
            i + 1,
            book.title,
            book.author,
            book.category_label()
        );
    }
    out.trim_end().to_string()
}

pub(crate) fn render_videos(videos: &[Video]) -> String {
    if videos.is_empty() {
        return "No videos found matching your search.".to_string();
    }
    let mut out = String::new();
    for (i, video) in videos.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {} from {} [{}]",
            i + 1,
            video.title,
            video.channel,
            video.category
        );
    }
    out.trim_end().to_string()
}

pub(crate) fn render_roadmap(subject: Subject, topics: &[Topic]) -> String {
    let mut out = format!("{}\n", subject.roadmap_title());
    if topics.is_empty() {
        out.push_str("No topics found matching your search.");
        return out;
    }
    for topic in topics {
        let _ = writeln!(out, "* {}", topic.name);
        match &topic.children {
            Some(children) => {
                for child in children {
                    match child.note.as_deref().filter(|n| !n.is_empty()) {
                        Some(note) => {
                            let _ = writeln!(out, "    - {}: {}", child.name, note);
                        }
                        None => {
                            let _ = writeln!(out, "    - {}", child.name);
                        }
                    }
                }
            }
            None => out.push_str("    No details available.\n"),
        }
    }
    out.trim_end().to_string()
}

pub(crate) fn render_subjects() -> String {
    Subject::ALL
        .iter()
        .map(|s| format!("  {:<8} {}", s.key(), s.roadmap_title()))
        .collect::<Vec<_>>()
        .join("\n")
}
