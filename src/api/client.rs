//! HTTP clients for the catalog search endpoint and the scan image host.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use url::Url;

use crate::catalog::{extract_descriptions, extract_search_results, extract_slugs, SearchResult};
use crate::config::Config;
use crate::error::{Error, Result};

/// Outcome of a single page request that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: StatusCode,
    /// Image bytes; empty unless `status` is 200.
    pub body: Vec<u8>,
}

impl PageResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// Source of scan pages.
///
/// Network failures are returned as errors (and may be retried by the
/// caller); any HTTP status, including 404, is a successful response.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &Url) -> Result<PageResponse>;
}

/// Client for the scan image host.
pub struct ScanClient {
    client: Client,
    referer: String,
}

impl ScanClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.catalog.user_agent)
            .timeout(Duration::from_secs(config.scans.request_timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            referer: config.scans.referer.clone(),
        })
    }
}

#[async_trait]
impl PageFetcher for ScanClient {
    async fn fetch_page(&self, url: &Url) -> Result<PageResponse> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(header::REFERER, &self.referer)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if status != StatusCode::OK {
            return Ok(PageResponse::status(status));
        }

        // A connection dropped mid-body surfaces as a decode error
        let bytes = response.bytes().await.map_err(|e| {
            Error::Network(format!("Failed to read body of {}: {}", url, e))
        })?;
        Ok(PageResponse::ok(bytes.to_vec()))
    }
}

/// Client for the catalog search endpoint.
pub struct CatalogClient {
    client: Client,
    home_url: String,
    search_url: String,
    catalog_url_prefix: String,
}

impl CatalogClient {
    pub fn new(config: &Config) -> Result<Self> {
        let catalog = &config.catalog;

        let mut headers = header::HeaderMap::new();
        let mut insert = |name: header::HeaderName, value: &str| -> Result<()> {
            let value = header::HeaderValue::from_str(value).map_err(|e| {
                Error::Config(format!("Invalid header value for {}: {}", name.as_str(), e))
            })?;
            headers.insert(name, value);
            Ok(())
        };

        let origin = Url::parse(&catalog.home_url)?.origin().ascii_serialization();

        insert(header::ACCEPT, "*/*")?;
        insert(header::ACCEPT_LANGUAGE, &catalog.accept_language)?;
        insert(header::ORIGIN, &origin)?;
        insert(header::REFERER, &catalog.catalog_url_prefix)?;
        insert(
            header::HeaderName::from_static("x-requested-with"),
            "XMLHttpRequest",
        )?;

        let client = Client::builder()
            .user_agent(&catalog.user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(config.scans.request_timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            home_url: catalog.home_url.clone(),
            search_url: catalog.search_url.clone(),
            catalog_url_prefix: catalog.catalog_url_prefix.clone(),
        })
    }

    /// Search the catalog, returning full entries.
    ///
    /// The home page is fetched first so the search runs on fresh cookies.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let reset = self.client.get(&self.home_url).send().await?;
        tracing::debug!("Cookie reset status: {}", reset.status());

        let html = self.post_query(query).await?;
        Ok(extract_search_results(&html))
    }

    /// Search the catalog, returning only the slugs of matching entries.
    pub async fn search_slugs(&self, query: &str) -> Result<Vec<String>> {
        let html = self.post_query(query).await?;
        extract_slugs(&html, &self.catalog_url_prefix)
    }

    /// Search the catalog, returning only the subtitle line of each entry.
    pub async fn search_names(&self, query: &str) -> Result<Vec<String>> {
        let html = self.post_query(query).await?;
        Ok(extract_descriptions(&html))
    }

    async fn post_query(&self, query: &str) -> Result<String> {
        tracing::debug!("POST {} query={:?}", self.search_url, query);

        let response = self
            .client
            .post(&self.search_url)
            .form(&[("query", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Search(format!(
                "HTTP {} for query '{}'",
                status, query
            )));
        }

        let text = response.text().await?;
        tracing::debug!("Search response length: {} bytes", text.len());
        Ok(text)
    }
}
