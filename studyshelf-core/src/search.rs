//! Case-insensitive substring filtering for catalog listings.

use crate::catalog::{Book, SubTopic, Topic, Video};

/// An entry that can be matched against a search query.
pub trait Searchable {
    /// Text fields the query is matched against. Absent fields are skipped.
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for Book {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.author.as_str()];
        fields.extend(self.category.as_deref());
        fields
    }
}

impl Searchable for Video {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.channel.as_str(),
            self.category.as_str(),
        ]
    }
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Keep the items where any search field contains the query.
///
/// The query is trimmed and compared case-insensitively; an empty query
/// keeps everything.
pub fn filter_items<T: Searchable + Clone>(query: &str, items: &[T]) -> Vec<T> {
    let needle = normalize(query);
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| item.search_fields().iter().any(|f| contains(f, &needle)))
        .cloned()
        .collect()
}

/// Filter a roadmap.
///
/// A topic whose name matches is kept whole. Otherwise it is kept with only
/// the children whose name or note matches, and dropped if none do.
pub fn filter_roadmap(query: &str, topics: &[Topic]) -> Vec<Topic> {
    let needle = normalize(query);
    if needle.is_empty() {
        return topics.to_vec();
    }

    topics
        .iter()
        .filter_map(|topic| {
            if contains(&topic.name, &needle) {
                return Some(topic.clone());
            }
            let matching: Vec<SubTopic> = topic
                .children
                .iter()
                .flatten()
                .filter(|child| {
                    contains(&child.name, &needle)
                        || child.note.as_deref().is_some_and(|n| contains(n, &needle))
                })
                .cloned()
                .collect();
            if matching.is_empty() {
                None
            } else {
                Some(Topic {
                    name: topic.name.clone(),
                    children: Some(matching),
                })
            }
        })
        .collect()
}
