//! Crawler module for page fetching and catalog building
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with redirect detection and retry logic
//! - HTML parsing of detail and listing pages
//! - Asset downloads
//! - Book resolution, category walking and catalog assembly
//!
//! Everything runs sequentially: one request is in flight at a time.

mod assembler;
mod downloader;
mod fetcher;
mod parser;
mod resolver;
mod retry;
mod walker;

pub use assembler::CatalogAssembler;
pub use downloader::{download_asset, save_file};
pub use fetcher::{build_http_client, check_redirect, FetchedResponse, Fetcher};
pub use parser::{
    extract_book, extract_category_ids, extract_page_count, parse_category_page, CategoryPage,
};
pub use resolver::BookResolver;
pub use retry::{RetryPolicy, DEFAULT_BACKOFF};
pub use walker::{CategoryWalk, CategoryWalker};

use crate::config::Config;
use crate::url::SiteUrls;
use crate::CatalogError;
use tokio_util::sync::CancellationToken;

/// The crawler components wired together from one configuration
#[derive(Debug, Clone)]
pub struct Crawler {
    pub walker: CategoryWalker,
    pub assembler: CatalogAssembler,
}

impl Crawler {
    /// Builds the HTTP client, fetcher, walker and assembler
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `cancel` - Token that interrupts the crawl when cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to walk and assemble
    /// * `Err(CatalogError)` - Invalid base URL or HTTP client setup failure
    pub fn new(config: &Config, cancel: CancellationToken) -> Result<Self, CatalogError> {
        let site = SiteUrls::from_config(&config.site)?;
        let client = build_http_client(&config.http)?;
        let retry = RetryPolicy::from_config(&config.retry);
        let fetcher = Fetcher::new(client, site, retry, cancel);

        Ok(Self {
            walker: CategoryWalker::new(fetcher.clone()),
            assembler: CatalogAssembler::new(BookResolver::new(fetcher, config.download.clone())),
        })
    }
}
