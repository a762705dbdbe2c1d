//! Catalog assembler
//!
//! Drives the [`BookResolver`] over a sequence of ids and collects the
//! successes into a [`Catalog`].

use crate::catalog::Catalog;
use crate::crawler::resolver::BookResolver;
use crate::output::RunStats;
use crate::CatalogError;

/// Builds catalogs from book ids
#[derive(Debug, Clone)]
pub struct CatalogAssembler {
    resolver: BookResolver,
}

impl CatalogAssembler {
    pub fn new(resolver: BookResolver) -> Self {
        Self { resolver }
    }

    /// Resolves every id and returns the resulting catalog
    ///
    /// Books that cannot be resolved are logged and left out. Run-level errors
    /// (filesystem, cancellation) abort and discard the partial catalog; use
    /// [`CatalogAssembler::extend_catalog`] to keep it.
    pub async fn build_catalog(&self, ids: &[u64]) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::new();
        let mut stats = RunStats::new();
        self.extend_catalog(&mut catalog, ids, &mut stats).await?;
        Ok(catalog)
    }

    /// Resolves every id into an existing catalog
    ///
    /// Ids already in the catalog are not fetched again, so the catalog never
    /// holds two records for one id. On a run-level error the records resolved
    /// so far stay in `catalog`.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Catalog receiving the records in input order
    /// * `ids` - Book ids to resolve
    /// * `stats` - Counters updated for every id
    pub async fn extend_catalog(
        &self,
        catalog: &mut Catalog,
        ids: &[u64],
        stats: &mut RunStats,
    ) -> Result<(), CatalogError> {
        let cancel = self.resolver.fetcher().cancel_token();
        stats.requested += ids.len() as u64;

        for (index, &id) in ids.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!("Interrupted after {} of {} book(s)", index, ids.len());
                return Err(CatalogError::Cancelled);
            }

            if catalog.contains(id) {
                tracing::debug!("Book {} already cataloged, skipping duplicate", id);
                stats.duplicates += 1;
                continue;
            }

            match self.resolver.resolve(id).await {
                Ok(record) => {
                    stats.record_assets(&record);
                    catalog.insert(record);
                    stats.cataloged += 1;
                }
                Err(e) if e.is_item_level() => {
                    tracing::warn!("Skipping book {}: {}", id, e);
                    stats.record_skip(e.kind());
                }
                Err(e) => return Err(e),
            }

            if (index + 1) % 10 == 0 {
                tracing::info!(
                    "Progress: {} of {} book(s) processed, {} cataloged",
                    index + 1,
                    ids.len(),
                    catalog.len()
                );
            }
        }

        Ok(())
    }
}
