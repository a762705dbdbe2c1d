//! Tululu-Catalog: a book catalog crawler
//!
//! This crate walks the category listings of a book-cataloging site, resolves
//! every book's detail page into a structured record, downloads the book text
//! and cover image, and writes the result as a JSON catalog.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Not found: {url} ({reason})")]
    NotFound { url: String, reason: String },

    #[error("Network error for {url}: {message}")]
    TransientNetwork { url: String, message: String },

    #[error("Malformed page {url}: {message}")]
    MalformedPage { url: String, message: String },

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Catalog serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a [`CatalogError`]
///
/// Callers branch on the kind rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The book or page does not exist
    NotFound,
    /// Connection refused or timed out
    TransientNetwork,
    /// The page does not have the expected layout
    MalformedPage,
    /// Writing to disk failed
    Filesystem,
    /// The run was interrupted
    Cancelled,
    /// Anything else (client errors, bad configuration, serialization)
    Other,
}

impl CatalogError {
    /// Returns the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TransientNetwork { .. } => ErrorKind::TransientNetwork,
            Self::MalformedPage { .. } => ErrorKind::MalformedPage,
            Self::Filesystem { .. } => ErrorKind::Filesystem,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) | Self::Http(_) | Self::UrlParse(_) | Self::Json(_) => {
                ErrorKind::Other
            }
        }
    }

    /// Returns true if the failed request may succeed when retried
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork { .. })
    }

    /// Returns true if the error only affects a single book or page
    ///
    /// Item-level errors are skipped and logged; everything else aborts the run.
    pub fn is_item_level(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::TransientNetwork { .. }
                | Self::MalformedPage { .. }
                | Self::Http(_)
                | Self::UrlParse(_)
        )
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{BookRecord, Catalog, ParsedBook};
pub use config::Config;
pub use crate::url::SiteUrls;
