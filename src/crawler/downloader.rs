//! Asset downloader
//!
//! Saves book texts and cover images to disk. Bytes are written to a `.part`
//! file next to the destination and renamed into place once complete, so an
//! interrupted download never shows up under its final name.

use crate::crawler::fetcher::Fetcher;
use crate::url::{file_name_from_url, sanitize_filename};
use crate::CatalogError;
use std::path::{Path, PathBuf};
use url::Url;

/// Downloads a resource and stores it in `dest_folder`
///
/// # Arguments
///
/// * `fetcher` - The fetcher used for the request (retry policy applies)
/// * `url` - The resource URL
/// * `params` - Query parameters for the request
/// * `dest_folder` - Target folder, created with intermediate folders if missing
/// * `filename` - Explicit file name; derived from the URL's last path segment
///   when `None`. Either way the name is sanitized.
///
/// # Returns
///
/// * `Ok(PathBuf)` - Where the file was written
/// * `Err(CatalogError::MalformedPage)` - No usable file name
/// * `Err(CatalogError::Filesystem)` - The file could not be written
/// * Any error of [`Fetcher::fetch`]
pub async fn download_asset(
    fetcher: &Fetcher,
    url: &Url,
    params: &[(&str, String)],
    dest_folder: &Path,
    filename: Option<&str>,
) -> Result<PathBuf, CatalogError> {
    let filename = match filename {
        Some(name) => sanitize_filename(name),
        None => file_name_from_url(url).unwrap_or_default(),
    };
    if filename.is_empty() {
        return Err(CatalogError::MalformedPage {
            url: url.to_string(),
            message: "cannot derive a file name".to_string(),
        });
    }

    let response = fetcher.fetch(url, params).await?;
    tracing::debug!("Fetched {} bytes from {}", response.body.len(), response.final_url);

    let path = dest_folder.join(&filename);
    save_file(&path, &response.body).await?;
    tracing::info!("Saved {}", path.display());

    Ok(path)
}

/// Writes `content` to `path`, replacing any existing file
///
/// Parent folders are created as needed.
pub async fn save_file(path: &Path, content: &[u8]) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CatalogError::filesystem(parent, e))?;
        }
    }

    let partial = partial_path(path);
    if let Err(e) = tokio::fs::write(&partial, content).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(CatalogError::filesystem(&partial, e));
    }

    tokio::fs::rename(&partial, path)
        .await
        .map_err(|e| CatalogError::filesystem(path, e))
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}
