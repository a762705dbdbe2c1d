/// Book record definitions
///
/// A record is assembled in two explicit stages: the extractor produces a
/// [`ParsedBook`] from the detail page, and the resolver turns it into a
/// [`BookRecord`] once the absolute download URL is known.
use serde::{Deserialize, Serialize};
use url::Url;

/// Fields extracted from a book's detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBook {
    /// Book title (left of the `::` delimiter)
    pub title: String,

    /// Book author (right of the `::` delimiter)
    pub author: String,

    /// Genre labels in document order
    pub genres: Vec<String>,

    /// Reader comments in document order
    pub comments: Vec<String>,

    /// Cover image URL, already resolved against the page URL
    pub cover_src: Option<Url>,
}

/// One entry of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    /// The site's book identifier
    pub id: u64,

    pub title: String,

    pub author: String,

    #[serde(default)]
    pub genres: Vec<String>,

    #[serde(default)]
    pub comments: Vec<String>,

    /// Absolute cover image URL, absent when the page has no cover
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,

    /// Absolute URL of the text resource, including the `id` query parameter
    pub download_url: String,

    /// Where the book text was saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_path: Option<String>,

    /// Where the cover image was saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_path: Option<String>,
}

impl BookRecord {
    /// Assembles a record from parsed page fields
    ///
    /// Local paths start out empty and are filled in by the resolver after
    /// each successful download.
    pub fn from_parsed(id: u64, parsed: ParsedBook, download_url: &Url) -> Self {
        Self {
            id,
            title: parsed.title,
            author: parsed.author,
            genres: parsed.genres,
            comments: parsed.comments,
            cover_url: parsed.cover_src.map(String::from),
            download_url: download_url.to_string(),
            text_path: None,
            cover_path: None,
        }
    }

    /// Name of the text file for this book, before sanitization
    pub fn text_file_name(&self) -> String {
        format!("{}_{}.txt", self.id, self.title)
    }
}
