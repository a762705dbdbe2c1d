//! Configuration module
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every setting has a default, so the crawler also runs
//! without a file.
//!
//! # Example
//!
//! ```no_run
//! use tululu_catalog::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("catalog.toml")).unwrap();
//! println!("Books will be saved to: {}", config.download.books_folder().display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AssetFailurePolicy, Config, DownloadConfig, HttpConfig, OutputConfig, RetryConfig, SiteConfig,
};

// Re-export parser functions
pub use parser::{load_config, load_or_default, parse_config};
pub use validation::validate;
