use serde::{Deserialize, Serialize};

/// One normalized piece of found content, tagged by kind.
///
/// The variant is fixed at construction and carries exactly the fields that
/// kind has: engagement counts exist only for videos, excerpts only for
/// articles. Serializes with a lowercase `"type"` discriminator, which is the
/// shape the browser client renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchResult {
    Video {
        title: String,
        link: String,
        /// Medium-size preview image; the provider may omit it.
        thumbnail: Option<String>,
        views: u64,
        likes: u64,
    },
    Article {
        title: String,
        link: String,
        snippet: String,
        /// Extracted from nested page metadata when available.
        thumbnail: Option<String>,
    },
}
