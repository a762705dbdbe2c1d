//! Category walker
//!
//! Enumerates the book ids of a category by walking its paginated listing.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{extract_category_ids, extract_page_count};
use crate::CatalogError;
use std::collections::HashSet;

/// Result of walking a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryWalk {
    /// Unique book ids in first-seen order
    pub ids: Vec<u64>,

    /// Number of pages the category declares
    pub page_count: u32,

    /// Last page the caller asked for
    pub requested_end: u32,

    /// Last page actually walked
    pub effective_end: u32,

    /// True if `requested_end` exceeded `page_count` and was lowered
    pub clamped: bool,

    /// Pages that could not be fetched and were skipped
    pub skipped_pages: Vec<u32>,
}

/// Walks category listings page by page
#[derive(Debug, Clone)]
pub struct CategoryWalker {
    fetcher: Fetcher,
}

impl CategoryWalker {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Collects the book ids of pages `start_page..=end_page` of a category
    ///
    /// Page 1 is always fetched first to learn the page count. `end_page` of
    /// `None` walks through the last page; an `end_page` past the last page is
    /// clamped and reported through [`CategoryWalk::clamped`].
    ///
    /// # Returns
    ///
    /// * `Ok(CategoryWalk)` - Ids of every page that could be fetched
    /// * `Err(CatalogError::NotFound)` - The category itself does not exist
    /// * `Err(CatalogError::Cancelled)` - Interrupted
    pub async fn enumerate(
        &self,
        category_id: u32,
        start_page: u32,
        end_page: Option<u32>,
    ) -> Result<CategoryWalk, CatalogError> {
        let site = self.fetcher.site();
        let start_page = start_page.max(1);

        tracing::info!("Reading page count of category {}", category_id);
        let first_page = self
            .fetcher
            .fetch(&site.category_page(category_id, 1), &[])
            .await?
            .text();
        let page_count = extract_page_count(&first_page);

        let requested_end = end_page.unwrap_or(page_count);
        let clamped = requested_end > page_count;
        let effective_end = requested_end.min(page_count);
        if clamped {
            tracing::warn!(
                "Category {} has {} page(s); requested end page {} clamped to {}",
                category_id,
                page_count,
                requested_end,
                effective_end
            );
        }

        let mut walk = CategoryWalk {
            ids: Vec::new(),
            page_count,
            requested_end,
            effective_end,
            clamped,
            skipped_pages: Vec::new(),
        };

        if start_page > effective_end {
            tracing::warn!(
                "Category {}: start page {} is past end page {}, nothing to walk",
                category_id,
                start_page,
                effective_end
            );
            return Ok(walk);
        }

        let mut seen = HashSet::new();
        for page in start_page..=effective_end {
            if self.fetcher.cancel_token().is_cancelled() {
                return Err(CatalogError::Cancelled);
            }

            let html = if page == 1 {
                first_page.clone()
            } else {
                match self.fetch_page(category_id, page).await {
                    Ok(html) => html,
                    Err(e) if e.is_item_level() => {
                        tracing::warn!("Skipping page {} of category {}: {}", page, category_id, e);
                        walk.skipped_pages.push(page);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            };

            let ids = extract_category_ids(&html);
            tracing::debug!("Category {} page {}: {} book(s)", category_id, page, ids.len());

            for id in ids {
                if seen.insert(id) {
                    walk.ids.push(id);
                } else {
                    tracing::debug!("Book {} listed twice, keeping first occurrence", id);
                }
            }
        }

        tracing::info!(
            "Category {}: {} unique book(s) on pages {}..={}",
            category_id,
            walk.ids.len(),
            start_page,
            effective_end
        );

        Ok(walk)
    }

    async fn fetch_page(&self, category_id: u32, page: u32) -> Result<String, CatalogError> {
        let url = self.fetcher.site().category_page(category_id, page);
        Ok(self.fetcher.fetch(&url, &[]).await?.text())
    }
}
