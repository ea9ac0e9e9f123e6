//! Runtime configuration.
//!
//! A single immutable [`Config`] is assembled at startup from three layers,
//! lowest priority first: built-in defaults, an optional YAML file, and CLI
//! flags / environment variables. `--secondary-lang` also moves
//! `secondary_base` to that language's Wikipedia, unless the file pointed
//! `secondary_base` somewhere else. The result is validated once and then handed to
//! each component at construction.
//!
//! ```yaml
//! page_url: https://en.wikipedia.org/wiki/Deaths_in_December_2025
//! secondary_lang: de
//! secondary_base: https://de.wikipedia.org
//! poll_interval_secs: 600
//! rate_limit_statuses: [429, 403]
//! smtp:
//!   host: smtp.example.com
//!   username: watcher@example.com
//!   to: me@example.com
//! ```

use crate::cli::Cli;
use crate::error::ConfigError;
use lettre::message::Mailbox;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Everything the watcher needs to know.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Listing page to poll.
    pub page_url: String,
    /// Primary wiki origin; article links are appended to it.
    pub primary_base: String,
    /// Secondary (preferred) wiki origin.
    pub secondary_base: String,
    /// Language code requested from the interlanguage lookup.
    pub secondary_lang: String,
    /// MediaWiki API endpoint of the primary wiki.
    pub api_url: String,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    /// Spacing between page fetches within one summary resolution.
    pub request_delay_secs: u64,
    /// Wait before resolving each new entry.
    pub entry_delay_secs: u64,
    /// Pause after a rate-limit response.
    pub rate_limit_backoff_secs: u64,
    /// HTTP statuses treated as "too many requests".
    pub rate_limit_statuses: Vec<u16>,
    pub poll_interval_secs: u64,
    pub state_file: PathBuf,
    /// Prepended to the entry name to form the message subject.
    pub subject_prefix: String,
    /// Email delivery; entries are only logged when absent.
    pub smtp: Option<SmtpConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_url: "https://en.wikipedia.org/wiki/Deaths_in_2025#December".to_string(),
            primary_base: "https://en.wikipedia.org".to_string(),
            secondary_base: wikipedia_origin("ru"),
            secondary_lang: "ru".to_string(),
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            user_agent: concat!(
                "wiki_deaths_watch/",
                env!("CARGO_PKG_VERSION"),
                " (set user_agent to include a contact address)"
            )
            .to_string(),
            http_timeout_secs: 10,
            request_delay_secs: 3,
            entry_delay_secs: 3,
            rate_limit_backoff_secs: 60,
            rate_limit_statuses: vec![429],
            poll_interval_secs: 300,
            state_file: PathBuf::from("state.json"),
            subject_prefix: "New entry: ".to_string(),
            smtp: None,
        }
    }
}

/// SMTP relay settings (STARTTLS submission).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Falls back to `username` when unset.
    #[serde(default)]
    pub from: Option<String>,
    pub to: String,
}

/// `https://<lang>.wikipedia.org`
fn wikipedia_origin(lang: &str) -> String {
    format!("https://{lang}.wikipedia.org")
}

fn default_smtp_port() -> u16 {
    587
}

impl SmtpConfig {
    /// Parsed sender mailbox.
    pub fn from_mailbox(&self) -> Result<Mailbox, ConfigError> {
        let value = self
            .from
            .as_deref()
            .or(self.username.as_deref())
            .ok_or_else(|| ConfigError::Invalid("smtp.from or smtp.username is required".into()))?;
        value.parse().map_err(|_| ConfigError::InvalidMailbox {
            field: "smtp.from",
            value: value.to_string(),
        })
    }

    /// Parsed recipient mailbox.
    pub fn to_mailbox(&self) -> Result<Mailbox, ConfigError> {
        self.to.parse().map_err(|_| ConfigError::InvalidMailbox {
            field: "smtp.to",
            value: self.to.clone(),
        })
    }
}

impl Config {
    /// Defaults, optionally overlaid with a YAML file.
    #[instrument(level = "info", skip_all, fields(path = ?path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!("Loaded config file");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as an empty map.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Build from the CLI: load the file it names, apply its overrides,
    /// validate.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::load(cli.config.as_deref())?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Overlay every flag the user actually gave.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.page_url {
            self.page_url = url.clone();
        }
        if let Some(path) = &cli.state_file {
            self.state_file = path.clone();
        }
        if let Some(secs) = cli.interval_secs {
            self.poll_interval_secs = secs;
        }
        if let Some(lang) = &cli.secondary_lang {
            // A base the file set explicitly is kept; one that merely follows
            // the language is moved along with it.
            if self.secondary_base == wikipedia_origin(&self.secondary_lang) {
                self.secondary_base = wikipedia_origin(lang);
            }
            self.secondary_lang = lang.clone();
        }

        if let Some(host) = &cli.smtp_host {
            let smtp = self.smtp.get_or_insert_with(|| SmtpConfig {
                host: host.clone(),
                port: default_smtp_port(),
                username: None,
                password: None,
                from: None,
                to: String::new(),
            });
            smtp.host = host.clone();
        }
        if let Some(smtp) = self.smtp.as_mut() {
            if let Some(port) = cli.smtp_port {
                smtp.port = port;
            }
            if let Some(user) = &cli.smtp_user {
                smtp.username = Some(user.clone());
            }
            if let Some(pass) = &cli.smtp_pass {
                smtp.password = Some(pass.clone());
            }
            if let Some(from) = &cli.email_from {
                smtp.from = Some(from.clone());
            }
            if let Some(to) = &cli.email_to {
                smtp.to = to.clone();
            }
        }
    }

    /// Reject configurations that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("page_url", &self.page_url),
            ("primary_base", &self.primary_base),
            ("secondary_base", &self.secondary_base),
            ("api_url", &self.api_url),
        ] {
            if Url::parse(value).is_err() {
                return Err(ConfigError::InvalidUrl {
                    field,
                    value: value.clone(),
                });
            }
        }
        if self.rate_limit_statuses.is_empty() {
            return Err(ConfigError::Invalid(
                "rate_limit_statuses must name at least one status".into(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("user_agent must not be empty".into()));
        }
        if let Some(smtp) = &self.smtp {
            smtp.from_mailbox()?;
            smtp.to_mailbox()?;
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }

    pub fn entry_delay(&self) -> Duration {
        Duration::from_secs(self.entry_delay_secs)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_secs(self.rate_limit_backoff_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
