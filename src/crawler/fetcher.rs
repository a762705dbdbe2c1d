//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests with optional query parameters
//! - Detecting "does not exist" responses (error status, redirect to home)
//! - Retrying connection failures according to a [`RetryPolicy`]
//! - Error classification

use crate::config::HttpConfig;
use crate::crawler::retry::RetryPolicy;
use crate::url::SiteUrls;
use crate::CatalogError;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

/// A successfully fetched resource
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status: StatusCode,

    /// Response body
    pub body: Bytes,
}

impl FetchedResponse {
    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed so that the final URL can be checked against the
/// site's home page.
///
/// # Example
///
/// ```no_run
/// use tululu_catalog::config::HttpConfig;
/// use tululu_catalog::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fails with `NotFound` if the response landed on the site's home page
///
/// The site answers requests for missing books and pages with a redirect to
/// its root instead of a 404. Must run after status validation.
pub fn check_redirect(final_url: &Url, site: &SiteUrls) -> Result<(), CatalogError> {
    if site.is_root(final_url) {
        return Err(CatalogError::NotFound {
            url: final_url.to_string(),
            reason: "redirected to home page".to_string(),
        });
    }
    Ok(())
}

/// Classifies a reqwest error raised while sending or reading a request
///
/// Connection failures and timeouts are transient; everything else is
/// returned as-is.
fn classify_error(url: &Url, error: reqwest::Error) -> CatalogError {
    if error.is_connect() {
        CatalogError::TransientNetwork {
            url: url.to_string(),
            message: format!("connection failed: {}", error),
        }
    } else if error.is_timeout() {
        CatalogError::TransientNetwork {
            url: url.to_string(),
            message: "request timed out".to_string(),
        }
    } else {
        CatalogError::Http(error)
    }
}

/// Fetches site resources with redirect detection and retry
///
/// Every outbound request of the crawler goes through [`Fetcher::fetch`].
///
/// # Request Flow
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Return the response |
/// | HTTP 4xx / 5xx | Immediate → NotFound |
/// | Redirected to the home page | Immediate → NotFound |
/// | Connection failure / timeout | Wait backoff, retry per policy |
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    site: SiteUrls,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(client: Client, site: SiteUrls, retry: RetryPolicy, cancel: CancellationToken) -> Self {
        Self {
            client,
            site,
            retry,
            cancel,
        }
    }

    pub fn site(&self) -> &SiteUrls {
        &self.site
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fetches a URL, retrying connection failures
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `params` - Query parameters appended to the URL
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedResponse)` - 2xx response that did not land on the home page
    /// * `Err(CatalogError::NotFound)` - Error status or redirect to home
    /// * `Err(CatalogError::TransientNetwork)` - Retries exhausted (bounded policy only)
    /// * `Err(CatalogError::Cancelled)` - Interrupted
    pub async fn fetch(
        &self,
        url: &Url,
        params: &[(&str, String)],
    ) -> Result<FetchedResponse, CatalogError> {
        self.retry
            .run(&self.cancel, url.as_str(), || self.fetch_once(url, params))
            .await
    }

    /// Issues a single GET request without retrying
    async fn fetch_once(
        &self,
        url: &Url,
        params: &[(&str, String)],
    ) -> Result<FetchedResponse, CatalogError> {
        tracing::debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(url.clone())
            .query(params)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let final_url = response.url().clone();
        tracing::debug!("{} -> {} ({})", url, final_url, status);

        if !status.is_success() {
            return Err(CatalogError::NotFound {
                url: final_url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        check_redirect(&final_url, &self.site)?;

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?;

        Ok(FetchedResponse {
            final_url,
            status,
            body,
        })
    }
}
