use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
///
/// Every section is optional in the TOML file and falls back to defaults that
/// target the live site.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL every page and endpoint is derived from
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Retry behavior on connection failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Delay between attempts (seconds)
    #[serde(rename = "backoff-secs", default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Maximum attempts per request; unbounded when absent
    #[serde(rename = "max-attempts", default)]
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_secs: default_backoff_secs(),
            max_attempts: None,
        }
    }
}

/// What to do with a book whose text or cover download failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFailurePolicy {
    /// Keep the metadata with the local path left empty
    #[default]
    Keep,
    /// Drop the book from the catalog
    Skip,
}

/// Asset download configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    /// Root folder for downloaded files
    #[serde(rename = "dest-folder", default = "default_dest_folder")]
    pub dest_folder: PathBuf,

    #[serde(rename = "books-subfolder", default = "default_books_subfolder")]
    pub books_subfolder: String,

    #[serde(rename = "images-subfolder", default = "default_images_subfolder")]
    pub images_subfolder: String,

    /// Do not download book texts
    #[serde(rename = "skip-txt", default)]
    pub skip_txt: bool,

    /// Do not download cover images
    #[serde(rename = "skip-imgs", default)]
    pub skip_imgs: bool,

    #[serde(rename = "asset-failure", default)]
    pub asset_failure: AssetFailurePolicy,
}

impl DownloadConfig {
    pub fn books_folder(&self) -> PathBuf {
        self.dest_folder.join(&self.books_subfolder)
    }

    pub fn images_folder(&self) -> PathBuf {
        self.dest_folder.join(&self.images_subfolder)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dest_folder: default_dest_folder(),
            books_subfolder: default_books_subfolder(),
            images_subfolder: default_images_subfolder(),
            skip_txt: false,
            skip_imgs: false,
            asset_failure: AssetFailurePolicy::Keep,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON catalog file
    #[serde(rename = "catalog-path", default = "default_catalog_path")]
    pub catalog_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://tululu.org/".to_string()
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_backoff_secs() -> u64 {
    5
}

fn default_dest_folder() -> PathBuf {
    PathBuf::from(".")
}

fn default_books_subfolder() -> String {
    "books".to_string()
}

fn default_images_subfolder() -> String {
    "images".to_string()
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("books_catalog.json")
}
