//! Summary resolution for a discovered entry.
//!
//! A [`SummaryResolver`] holds an ordered chain of [`SummarySource`]s: the
//! secondary-language wiki first (found through the interlanguage lookup),
//! then the primary wiki. Every source fetches through one [`FetchSession`],
//! which spaces requests, remembers the last URL tried, and turns a
//! rate-limit response into an abort of the whole chain.
//!
//! Ordinary failures (transport errors, non-200 statuses, pages without a
//! usable lead paragraph) only move resolution on to the next source. A
//! rate-limit status stops it: the resolver backs off once and reports the
//! throttled URL with empty text.

use crate::config::Config;
use crate::fetch::{Fetcher, InterlanguageLookup};
use crate::html::content_container;
use crate::models::SummaryResult;
use crate::pause::Pause;
use crate::tree::Element;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Class MediaWiki puts on a deliberately empty leading paragraph.
const EMPTY_PARAGRAPH_CLASS: &str = "mw-empty-elt";
const ARTICLE_PREFIX: &str = "/wiki/";

/// A fetch answered with a rate-limit status; resolution must stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimited {
    pub url: String,
}

/// Timing and status rules for one resolution.
#[derive(Debug, Clone)]
pub struct ResolvePolicy {
    pub request_delay: Duration,
    pub rate_limit_backoff: Duration,
    pub rate_limit_statuses: Vec<u16>,
}

impl ResolvePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_delay: config.request_delay(),
            rate_limit_backoff: config.rate_limit_backoff(),
            rate_limit_statuses: config.rate_limit_statuses.clone(),
        }
    }

    pub fn is_rate_limited(&self, status: u16) -> bool {
        self.rate_limit_statuses.contains(&status)
    }
}

/// Per-resolution fetch state shared by all sources of the chain.
pub struct FetchSession<'a> {
    fetcher: &'a dyn Fetcher,
    pause: &'a dyn Pause,
    policy: &'a ResolvePolicy,
    fetches: usize,
    last_url: Option<String>,
}

impl<'a> FetchSession<'a> {
    fn new(fetcher: &'a dyn Fetcher, pause: &'a dyn Pause, policy: &'a ResolvePolicy) -> Self {
        Self {
            fetcher,
            pause,
            policy,
            fetches: 0,
            last_url: None,
        }
    }

    /// Fetch `url` and extract its lead paragraph.
    ///
    /// `Ok(None)` covers every recoverable failure; `Err` only a rate limit,
    /// after the backoff pause has been taken.
    pub async fn summary_from(&mut self, url: &str) -> Result<Option<String>, RateLimited> {
        if self.fetches > 0 {
            self.pause.pause(self.policy.request_delay).await;
        }
        self.fetches += 1;
        self.last_url = Some(url.to_string());

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(%url, error = %e, "Summary fetch failed; trying next source");
                return Ok(None);
            }
        };

        if self.policy.is_rate_limited(page.status) {
            warn!(
                %url,
                status = page.status,
                backoff = ?self.policy.rate_limit_backoff,
                "Rate limited; backing off and abandoning this entry"
            );
            self.pause.pause(self.policy.rate_limit_backoff).await;
            return Err(RateLimited {
                url: url.to_string(),
            });
        }

        if !page.is_ok() {
            debug!(%url, status = page.status, "Non-200 summary page; trying next source");
            return Ok(None);
        }

        let text = extract_summary(&page.body);
        if text.is_empty() {
            debug!(%url, "No usable lead paragraph");
            return Ok(None);
        }
        Ok(Some(text))
    }
}

/// One link in the fallback chain.
#[async_trait]
pub trait SummarySource: Send + Sync {
    /// Short label for logs.
    fn label(&self) -> &'static str;

    /// Try to produce a summary for `link`. `Ok(None)` passes to the next
    /// source; `Err` aborts the chain.
    async fn attempt(
        &self,
        link: &str,
        session: &mut FetchSession<'_>,
    ) -> Result<Option<SummaryResult>, RateLimited>;
}

/// The same article on another-language wiki, located via interlanguage links.
pub struct SecondarySource {
    lookup: Arc<dyn InterlanguageLookup>,
    base: String,
}

impl SecondarySource {
    pub fn new(lookup: Arc<dyn InterlanguageLookup>, base: impl Into<String>) -> Self {
        Self {
            lookup,
            base: base.into(),
        }
    }

    fn article_url(&self, title: &str) -> String {
        format!(
            "{}{}{}",
            self.base.trim_end_matches('/'),
            ARTICLE_PREFIX,
            title.replace(' ', "_")
        )
    }
}

#[async_trait]
impl SummarySource for SecondarySource {
    fn label(&self) -> &'static str {
        "secondary"
    }

    async fn attempt(
        &self,
        link: &str,
        session: &mut FetchSession<'_>,
    ) -> Result<Option<SummaryResult>, RateLimited> {
        let title = article_title(link);
        let translated = match self.lookup.lookup(&title).await {
            Ok(Some(t)) => t,
            Ok(None) => {
                debug!(%title, "No interlanguage link");
                return Ok(None);
            }
            Err(e) => {
                debug!(%title, error = %e, "Interlanguage lookup failed");
                return Ok(None);
            }
        };

        let url = self.article_url(&translated);
        Ok(session
            .summary_from(&url)
            .await?
            .map(|text| SummaryResult {
                text,
                source_url: url,
            }))
    }
}

/// The article the listing links to, on the primary wiki.
pub struct PrimarySource {
    base: String,
}

impl PrimarySource {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

#[async_trait]
impl SummarySource for PrimarySource {
    fn label(&self) -> &'static str {
        "primary"
    }

    async fn attempt(
        &self,
        link: &str,
        session: &mut FetchSession<'_>,
    ) -> Result<Option<SummaryResult>, RateLimited> {
        let url = format!("{}{}", self.base.trim_end_matches('/'), link);
        Ok(session
            .summary_from(&url)
            .await?
            .map(|text| SummaryResult {
                text,
                source_url: url,
            }))
    }
}

/// Runs the source chain for one entry at a time.
pub struct SummaryResolver {
    sources: Vec<Box<dyn SummarySource>>,
    fetcher: Arc<dyn Fetcher>,
    pause: Arc<dyn Pause>,
    policy: ResolvePolicy,
}

impl SummaryResolver {
    pub fn new(
        sources: Vec<Box<dyn SummarySource>>,
        fetcher: Arc<dyn Fetcher>,
        pause: Arc<dyn Pause>,
        policy: ResolvePolicy,
    ) -> Self {
        Self {
            sources,
            fetcher,
            pause,
            policy,
        }
    }

    /// Secondary wiki first, primary wiki second.
    pub fn from_config(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        lookup: Arc<dyn InterlanguageLookup>,
        pause: Arc<dyn Pause>,
    ) -> Self {
        let sources: Vec<Box<dyn SummarySource>> = vec![
            Box::new(SecondarySource::new(lookup, config.secondary_base.clone())),
            Box::new(PrimarySource::new(config.primary_base.clone())),
        ];
        Self::new(sources, fetcher, pause, ResolvePolicy::from_config(config))
    }

    /// Resolve the summary for one entry.
    ///
    /// # Arguments
    ///
    /// * `link` - Path-style article link from the listing, e.g. `/wiki/Jane_Doe`
    ///
    /// # Returns
    ///
    /// The first non-empty summary in chain order, or empty text with the
    /// last URL attempted (the throttled one, after a rate limit).
    #[instrument(level = "info", skip_all, fields(%link))]
    pub async fn resolve(&self, link: &str) -> SummaryResult {
        let mut session = FetchSession::new(&*self.fetcher, &*self.pause, &self.policy);

        for source in &self.sources {
            match source.attempt(link, &mut session).await {
                Ok(Some(found)) => {
                    info!(source = source.label(), url = %found.source_url, "Resolved summary");
                    return found;
                }
                Ok(None) => continue,
                Err(RateLimited { url }) => return SummaryResult::empty(url),
            }
        }

        let last = session.last_url.unwrap_or_default();
        warn!(url = %last, "No source produced a summary");
        SummaryResult::empty(last)
    }
}

/// Decoded article title from a `/wiki/<Title>` link.
pub fn article_title(link: &str) -> String {
    let raw = link.strip_prefix(ARTICLE_PREFIX).unwrap_or(link);
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Sanitized lead paragraph of an article page; empty when none is usable.
pub fn extract_summary(html: &str) -> String {
    content_container(html)
        .map(|container| lead_paragraph(&container))
        .unwrap_or_default()
}

/// First paragraph of the container, or the second when the first is the
/// empty placeholder.
///
/// Links are unwrapped. Superscripts (citation markers) and the contents of
/// inline `<style>`/`<script>` elements are dropped before the text is taken.
///
/// # Returns
///
/// The trimmed visible text, or an empty string when no paragraph qualifies.
pub fn lead_paragraph(container: &Element) -> String {
    let paragraphs = container.descendants_named("p");
    let Some(first) = paragraphs.first() else {
        return String::new();
    };
    let chosen = if first.has_class(EMPTY_PARAGRAPH_CLASS) {
        match paragraphs.get(1) {
            Some(second) => second,
            None => return String::new(),
        }
    } else {
        first
    };

    chosen
        .unwrapped("a")
        .pruned("sup")
        .pruned("style")
        .pruned("script")
        .text()
        .trim()
        .to_string()
}
