//! Typed errors for the watch pipeline.
//!
//! Every collaborator (HTTP, SMTP, state file, configuration) gets its own
//! `thiserror` enum; [`MonitorError`] aggregates the ones that can end a poll
//! cycle. Recoverable failures (a summary source that cannot be fetched, a
//! notification that cannot be delivered) never surface as `MonitorError`;
//! they are logged where they happen.

use thiserror::Error;

/// Failures talking to a page or API endpoint.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, TLS, or timeout failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a status we cannot use.
    #[error("unexpected HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The body could not be decoded as the expected JSON shape.
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("notifier misconfigured: {0}")]
    Config(#[from] ConfigError),
}

/// Failures reading or writing the seen-entry state file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is not a JSON string array: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("invalid mailbox for {field}: {value}")]
    InvalidMailbox { field: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),
}

/// Errors that abort a whole poll cycle.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("listing page unavailable: {0}")]
    Listing(#[from] FetchError),

    #[error("state store failure: {0}")]
    Store(#[from] StoreError),
}
