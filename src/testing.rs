//! In-memory collaborators for tests.

use crate::error::{ConfigError, FetchError, NotifyError};
use crate::fetch::{Fetcher, InterlanguageLookup, PageResponse};
use crate::notify::Notifier;
use crate::pause::Pause;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Wrap body HTML in a minimal MediaWiki page skeleton.
pub fn article_page(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>t</title></head><body>\
         <div id=\"mw-content-text\" class=\"mw-body-content\">\n<div class=\"mw-parser-output\">{body}</div></div>\
         </body></html>"
    )
}

/// Any error stands in for a transport failure; callers only check `is_err`.
fn transport_failure(url: &str) -> FetchError {
    FetchError::Status {
        url: url.to_string(),
        status: 0,
    }
}

/// URL-keyed page fetcher. Unknown URLs answer 404.
#[derive(Default)]
pub struct MapFetcher {
    pages: HashMap<String, Option<PageResponse>>,
    requests: Mutex<Vec<String>>,
}

impl MapFetcher {
    pub fn page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Some(PageResponse {
                status,
                body: body.to_string(),
            }),
        );
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), None);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<PageResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(Some(page)) => Ok(page.clone()),
            Some(None) => Err(transport_failure(url)),
            None => Ok(PageResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

/// Title-keyed interlanguage lookup. Unknown titles have no counterpart.
#[derive(Default)]
pub struct FixedLookup {
    titles: HashMap<String, String>,
    fail: bool,
}

impl FixedLookup {
    pub fn title(mut self, from: &str, to: &str) -> Self {
        self.titles.insert(from.to_string(), to.to_string());
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl InterlanguageLookup for FixedLookup {
    async fn lookup(&self, title: &str) -> Result<Option<String>, FetchError> {
        if self.fail {
            return Err(transport_failure("lookup"));
        }
        Ok(self.titles.get(title).cloned())
    }
}

/// Records every message; optionally refuses them all.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        if self.fail {
            return Err(NotifyError::Config(ConfigError::Invalid(
                "recording notifier set to fail".into(),
            )));
        }
        Ok(())
    }
}

/// Records requested pauses without sleeping.
#[derive(Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}
