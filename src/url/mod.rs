//! URL handling module
//!
//! This module derives every page and endpoint URL of the target site from a
//! single configured base URL, and turns titles and URLs into safe file names.

mod sanitize;

pub use sanitize::{file_name_from_url, sanitize_filename};

use crate::config::SiteConfig;
use crate::ConfigError;
use url::Url;

/// Path of the shared text download endpoint, relative to the site root
pub const DOWNLOAD_ENDPOINT: &str = "/txt.php";

/// URL scheme of the target site
///
/// Built once from configuration and passed to every component that needs to
/// build or recognize site URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    base: Url,
    root: Url,
}

impl SiteUrls {
    /// Creates the URL scheme from a base URL
    ///
    /// A missing trailing slash is added so relative joins stay under the
    /// base path.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let root = base
            .join("/")
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

        Ok(Self { base, root })
    }

    /// Creates the URL scheme from the site configuration
    pub fn from_config(config: &SiteConfig) -> Result<Self, ConfigError> {
        Self::new(&config.base_url)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The site's home page, where missing resources redirect to
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Returns true if the URL is the site's home page
    pub fn is_root(&self, url: &Url) -> bool {
        let mut url = url.clone();
        url.set_fragment(None);
        url == self.root
    }

    /// Detail page of a book, e.g. `https://tululu.org/b239/`
    pub fn book_page(&self, id: u64) -> Url {
        self.join(&format!("b{}/", id))
    }

    /// Listing page of a category
    ///
    /// Page 1 lives at the bare category path (`l55/`); later pages append the
    /// page number (`l55/2/`).
    pub fn category_page(&self, category_id: u32, page: u32) -> Url {
        if page <= 1 {
            self.join(&format!("l{}/", category_id))
        } else {
            self.join(&format!("l{}/{}/", category_id, page))
        }
    }

    // Joining a relative path made only of ASCII letters, digits, '.', '_'
    // and '/' onto a valid base cannot fail.
    fn join(&self, relative: &str) -> Url {
        self.base
            .join(relative)
            .unwrap_or_else(|_| self.base.clone())
    }
}

/// Resolves the text download URL for a book
///
/// The endpoint is resolved against the final URL of the detail page and
/// carries the book id as its `id` query parameter.
pub fn download_url(page_url: &Url, id: u64) -> Result<Url, url::ParseError> {
    let mut url = page_url.join(DOWNLOAD_ENDPOINT)?;
    url.query_pairs_mut()
        .clear()
        .append_pair("id", &id.to_string());
    Ok(url)
}
