//! Book resolver
//!
//! Turns a book id into a complete [`BookRecord`]: fetch the detail page,
//! extract its fields, then download the text and cover.

use crate::catalog::BookRecord;
use crate::config::{AssetFailurePolicy, DownloadConfig};
use crate::crawler::downloader::download_asset;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::extract_book;
use crate::url::download_url;
use crate::CatalogError;
use std::path::{Path, PathBuf};

/// Resolves book ids into catalog records
#[derive(Debug, Clone)]
pub struct BookResolver {
    fetcher: Fetcher,
    download: DownloadConfig,
}

impl BookResolver {
    pub fn new(fetcher: Fetcher, download: DownloadConfig) -> Self {
        Self { fetcher, download }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Resolves one book
    ///
    /// # Steps
    ///
    /// 1. Fetch the detail page
    /// 2. Extract fields and resolve the cover and download URLs against the
    ///    page's final URL
    /// 3. Download the text and the cover unless disabled by configuration
    ///
    /// # Returns
    ///
    /// * `Ok(BookRecord)` - The record; local paths are empty for skipped or
    ///   (with [`AssetFailurePolicy::Keep`]) failed downloads
    /// * `Err(CatalogError::NotFound)` - The book does not exist
    /// * `Err(CatalogError::MalformedPage)` - The page layout is unexpected
    /// * `Err(_)` - Run-level failures (filesystem, cancellation) and, with
    ///   [`AssetFailurePolicy::Skip`], asset download failures
    pub async fn resolve(&self, id: u64) -> Result<BookRecord, CatalogError> {
        tracing::debug!("Resolving book {}", id);

        let page_url = self.fetcher.site().book_page(id);
        let page = self.fetcher.fetch(&page_url, &[]).await?;

        let parsed = extract_book(&page.text(), &page.final_url)?;
        let text_url = download_url(&page.final_url, id)?;
        let cover_url = parsed.cover_src.clone();
        let mut record = BookRecord::from_parsed(id, parsed, &text_url);

        if self.download.skip_txt {
            tracing::debug!("Skipping text download for book {}", id);
        } else {
            let folder = self.download.books_folder();
            let name = record.text_file_name();
            let result = download_asset(&self.fetcher, &text_url, &[], &folder, Some(&name)).await;
            record.text_path = self.settle_asset(id, "text", result)?;
        }

        match (cover_url, self.download.skip_imgs) {
            (_, true) => tracing::debug!("Skipping cover download for book {}", id),
            (None, false) => tracing::debug!("Book {} has no cover", id),
            (Some(cover_url), false) => {
                let folder = self.download.images_folder();
                let result = download_asset(&self.fetcher, &cover_url, &[], &folder, None).await;
                record.cover_path = self.settle_asset(id, "cover", result)?;
            }
        }

        tracing::info!("Resolved book {}: {} / {}", id, record.title, record.author);
        Ok(record)
    }

    /// Applies the asset failure policy to a download result
    fn settle_asset(
        &self,
        id: u64,
        asset: &str,
        result: Result<PathBuf, CatalogError>,
    ) -> Result<Option<String>, CatalogError> {
        match result {
            Ok(path) => Ok(Some(path_to_string(&path))),
            Err(e) if !e.is_item_level() => Err(e),
            Err(e) => match self.download.asset_failure {
                AssetFailurePolicy::Keep => {
                    tracing::warn!("Book {}: {} download failed, keeping metadata: {}", id, asset, e);
                    Ok(None)
                }
                AssetFailurePolicy::Skip => Err(e),
            },
        }
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
