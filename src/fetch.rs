//! HTTP collaborators: page fetching and the interlanguage-link lookup.
//!
//! Both are traits so the resolver and the monitor can be driven by
//! in-memory fakes; the production implementations share one
//! `reqwest::Client` carrying the configured timeout and User-Agent.

use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Status and body of a fetched page. Non-2xx statuses are not errors at
/// this layer; the caller decides what a 404 or 429 means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// GET a page by absolute URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageResponse, FetchError>;
}

/// Find the title of the same article on the secondary-language wiki.
#[async_trait]
pub trait InterlanguageLookup: Send + Sync {
    async fn lookup(&self, title: &str) -> Result<Option<String>, FetchError>;
}

/// Build the shared client.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(FetchError::Client)
}

/// `reqwest`-backed [`Fetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<PageResponse, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;
        debug!(status, bytes = body.len(), "Fetched page");
        Ok(PageResponse { status, body })
    }
}

/// MediaWiki `prop=langlinks` lookup against the primary wiki's API.
#[derive(Debug, Clone)]
pub struct LangLinksLookup {
    client: Client,
    api_url: String,
    lang: String,
}

impl LangLinksLookup {
    pub fn new(client: Client, api_url: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            lang: lang.into(),
        }
    }
}

#[async_trait]
impl InterlanguageLookup for LangLinksLookup {
    #[instrument(level = "debug", skip_all, fields(%title, lang = %self.lang))]
    async fn lookup(&self, title: &str) -> Result<Option<String>, FetchError> {
        let url = self.api_url.as_str();
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("prop", "langlinks"),
                ("lllang", self.lang.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(transport)?;
        let found = parse_langlinks(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })?;
        debug!(found = ?found, "Interlanguage lookup finished");
        Ok(found)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<ApiQuery>,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    pages: BTreeMap<String, ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    langlinks: Vec<ApiLangLink>,
}

#[derive(Debug, Deserialize)]
struct ApiLangLink {
    #[serde(rename = "*")]
    title: String,
}

/// First interlanguage title found on any returned page.
pub fn parse_langlinks(body: &str) -> Result<Option<String>, serde_json::Error> {
    let response: ApiResponse = serde_json::from_str(body)?;
    Ok(response.query.and_then(|q| {
        q.pages
            .into_values()
            .find_map(|page| page.langlinks.into_iter().next())
            .map(|link| link.title)
    }))
}
