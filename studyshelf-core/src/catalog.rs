use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CoreError;

pub const BOOKS_FILE: &str = "books.json";
pub const VIDEOS_FILE: &str = "videos.json";

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    /// Locator of the book's pages, relative to the content root.
    pub file: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Cover gradient start colour.
    #[serde(default)]
    pub color: Option<String>,
    /// Cover gradient end colour.
    #[serde(default, rename = "colorEnd")]
    pub color_end: Option<String>,
}

impl Book {
    /// Category shown on the card; books without one are listed as mathematics.
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or("Mathematics")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub title: String,
    pub channel: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTopic {
    pub name: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// A roadmap entry. `children` is `None` when the topic has no details at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub children: Option<Vec<SubTopic>>,
}

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    #[default]
    Math,
    Physics,
    Cs,
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::Math, Subject::Physics, Subject::Cs];

    /// Roadmap file for the subject inside the data directory.
    pub fn topics_file(self) -> &'static str {
        match self {
            Self::Math => "topics.json",
            Self::Physics => "physics.json",
            Self::Cs => "cs.json",
        }
    }

    pub fn roadmap_title(self) -> &'static str {
        match self {
            Self::Math => "Mathematics Roadmap",
            Self::Physics => "Physics Roadmap",
            Self::Cs => "Computer Science Roadmap",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Physics => "physics",
            Self::Cs => "cs",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Subject {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "math" => Ok(Self::Math),
            "physics" => Ok(Self::Physics),
            "cs" => Ok(Self::Cs),
            _ => Err(CoreError::UnknownSubject(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BooksFile {
    #[serde(default)]
    books: Vec<Book>,
}

#[derive(Debug, Deserialize)]
struct VideosFile {
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct TopicsFile {
    #[serde(default)]
    topics: Vec<Topic>,
}

/// Everything shown for one subject: its roadmap plus the shared book and
/// video lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub subject: Subject,
    pub books: Vec<Book>,
    pub videos: Vec<Video>,
    pub topics: Vec<Topic>,
}

impl Catalog {
    /// Load the subject's roadmap and the book/video lists from `data_dir`.
    ///
    /// Fails as a whole if any of the three files cannot be read or parsed.
    pub fn load(data_dir: &Path, subject: Subject) -> crate::Result<Self> {
        let topics: TopicsFile = read_json(&data_dir.join(subject.topics_file()))?;
        let books: BooksFile = read_json(&data_dir.join(BOOKS_FILE))?;
        let videos: VideosFile = read_json(&data_dir.join(VIDEOS_FILE))?;

        info!(
            %subject,
            books = books.books.len(),
            videos = videos.videos.len(),
            topics = topics.topics.len(),
            "Catalog loaded"
        );

        Ok(Self {
            subject,
            books: books.books,
            videos: videos.videos,
            topics: topics.topics,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> crate::Result<T> {
    debug!("Reading {}", path.display());
    let json = fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: PathBuf::from(path),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| CoreError::Parse {
        path: PathBuf::from(path),
        source,
    })
}
