//! HTML parser for book detail pages and category listings
//!
//! This module handles parsing HTML content to extract:
//! - Title, author, genres, comments and cover of a book
//! - Book ids listed on a category page
//! - The number of pages a category spans
//!
//! All functions are pure: the same HTML and base URL always give the same
//! result.

use crate::catalog::ParsedBook;
use crate::CatalogError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Separator between title and author in a detail page heading
const TITLE_AUTHOR_DELIMITER: &str = "::";

/// Book ids and pagination found on one category listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPage {
    /// Book ids in listing order, duplicates kept
    pub ids: Vec<u64>,

    /// Total number of pages declared by the pagination control (>= 1)
    pub page_count: u32,
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parses a book's detail page
///
/// # Layout
///
/// - `h1` - `Title :: Author`
/// - `div.bookimage img[src]` - cover image (optional)
/// - `div.texts span` - one reader comment per `div.texts`
/// - `span.d_book a` - genre links
///
/// # Arguments
///
/// * `html` - The HTML content of the page
/// * `page_url` - The final URL of the page, used to resolve the cover URL
///
/// # Returns
///
/// * `Ok(ParsedBook)` - The extracted fields
/// * `Err(CatalogError::MalformedPage)` - Missing heading, delimiter, or genre block
///
/// # Example
///
/// ```
/// use tululu_catalog::crawler::extract_book;
/// use url::Url;
///
/// let html = r#"<h1>Dune :: Frank Herbert</h1><span class="d_book"><a href="/l55/">Sci-Fi</a></span>"#;
/// let page_url = Url::parse("https://tululu.org/b1/").unwrap();
/// let book = extract_book(html, &page_url).unwrap();
/// assert_eq!(book.title, "Dune");
/// assert_eq!(book.author, "Frank Herbert");
/// ```
pub fn extract_book(html: &str, page_url: &Url) -> Result<ParsedBook, CatalogError> {
    let document = Html::parse_document(html);
    let malformed = |message: &str| CatalogError::MalformedPage {
        url: page_url.to_string(),
        message: message.to_string(),
    };

    let heading = selector("h1")
        .and_then(|h1| document.select(&h1).next().map(element_text))
        .ok_or_else(|| malformed("page has no heading"))?;

    let (title, author) = heading
        .split_once(TITLE_AUTHOR_DELIMITER)
        .ok_or_else(|| malformed("heading has no title/author delimiter"))?;
    let (title, author) = (title.trim(), author.trim());
    if title.is_empty() {
        return Err(malformed("heading has an empty title"));
    }
    if author.is_empty() {
        return Err(malformed("heading has an empty author"));
    }

    let cover_src = extract_cover(&document, page_url)?;
    let comments = extract_comments(&document);
    let genres = extract_genres(&document).ok_or_else(|| malformed("page has no genre block"))?;

    Ok(ParsedBook {
        title: title.to_string(),
        author: author.to_string(),
        genres,
        comments,
        cover_src,
    })
}

/// Resolves the cover image URL, `None` when the page has no cover
fn extract_cover(document: &Html, page_url: &Url) -> Result<Option<Url>, CatalogError> {
    let Some(img) = selector("div.bookimage img") else {
        return Ok(None);
    };
    let src = document
        .select(&img)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty());

    match src {
        Some(src) => Ok(Some(page_url.join(src)?)),
        None => Ok(None),
    }
}

/// Collects the first `span` of every comment block, in document order
fn extract_comments(document: &Html) -> Vec<String> {
    let (Some(texts), Some(span)) = (selector("div.texts"), selector("span")) else {
        return Vec::new();
    };
    document
        .select(&texts)
        .filter_map(|block| block.select(&span).next())
        .map(element_text)
        .collect()
}

/// Collects the genre link labels, `None` when the genre block is missing
fn extract_genres(document: &Html) -> Option<Vec<String>> {
    let link = selector("a")?;
    let block = document.select(&selector("span.d_book")?).next()?;
    Some(
        block
            .select(&link)
            .map(element_text)
            .filter(|genre| !genre.is_empty())
            .collect(),
    )
}

/// Extracts the book ids listed on a category page
///
/// For each `table.d_book` entry the first link's target is taken and all
/// non-digit characters are stripped (`/b239/` → 239). Entries without a
/// numeric link are ignored. An empty listing yields an empty vector.
pub fn extract_category_ids(html: &str) -> Vec<u64> {
    let document = Html::parse_document(html);
    let (Some(entries), Some(link)) = (selector("table.d_book"), selector("a[href]")) else {
        return Vec::new();
    };

    document
        .select(&entries)
        .filter_map(|entry| entry.select(&link).next())
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let digits: String = href.chars().filter(char::is_ascii_digit).collect();
            digits.parse::<u64>().ok()
        })
        .collect()
}

/// Reads the number of pages a category spans
///
/// The pagination control lists page links as `a.npage`; the last label is
/// the page count. Without a pagination control the category has one page.
pub fn extract_page_count(html: &str) -> u32 {
    let document = Html::parse_document(html);

    selector("a.npage")
        .and_then(|npage| document.select(&npage).last().map(element_text))
        .and_then(|label| label.parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}

/// Parses a category listing page into ids and page count
pub fn parse_category_page(html: &str) -> CategoryPage {
    CategoryPage {
        ids: extract_category_ids(html),
        page_count: extract_page_count(html),
    }
}
