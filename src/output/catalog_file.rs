//! Catalog file reading and writing
//!
//! The catalog is stored as a pretty-printed JSON array (4-space indent) with
//! non-ASCII characters written literally, as expected by the page renderer.

use crate::catalog::{BookRecord, Catalog};
use crate::crawler::save_file;
use crate::CatalogError;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::Path;

/// Serializes a catalog to pretty-printed JSON
pub fn catalog_to_json(catalog: &Catalog) -> Result<Vec<u8>, CatalogError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    catalog.records().serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Writes the catalog file, replacing any previous one
///
/// The file is written next to its final location and renamed into place.
///
/// # Arguments
///
/// * `path` - Destination of the JSON file; parent folders are created
/// * `catalog` - The catalog to write
pub async fn write_catalog(path: &Path, catalog: &Catalog) -> Result<(), CatalogError> {
    let json = catalog_to_json(catalog)?;
    save_file(path, &json).await?;
    tracing::info!("Wrote {} book(s) to {}", catalog.len(), path.display());
    Ok(())
}

/// Reads a catalog file
///
/// Records with an id seen earlier in the file are dropped.
pub async fn read_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| CatalogError::filesystem(path, e))?;
    let records: Vec<BookRecord> = serde_json::from_slice(&content)?;
    Ok(Catalog::from_records(records))
}
