//! Command-line interface definitions for the watcher.
//!
//! Every option can also come from an environment variable; anything given
//! here overrides the YAML config file, which in turn overrides the built-in
//! defaults.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Watch the default page, logging new entries instead of mailing them
/// wiki_deaths_watch
///
/// # Watch a specific month page once and exit
/// wiki_deaths_watch --page-url https://en.wikipedia.org/wiki/Deaths_in_December_2025 --once
///
/// # Full configuration from a file, SMTP password from the environment
/// SMTP_PASS=... wiki_deaths_watch -c watch.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "WATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listing page to watch
    #[arg(short, long, env = "WATCH_PAGE_URL")]
    pub page_url: Option<String>,

    /// JSON file holding already-notified entry keys
    #[arg(short, long, env = "WATCH_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Seconds between poll cycles
    #[arg(short, long, env = "WATCH_INTERVAL_SECS")]
    pub interval_secs: Option<u64>,

    /// Language code of the preferred summary wiki (e.g. `ru`)
    #[arg(long, env = "WATCH_SECONDARY_LANG")]
    pub secondary_lang: Option<String>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    pub once: bool,

    /// SMTP relay host; enables email delivery
    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP submission port
    #[arg(long, env = "SMTP_PORT")]
    pub smtp_port: Option<u16>,

    /// SMTP username
    #[arg(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    /// SMTP password
    #[arg(long, env = "SMTP_PASS", hide_env_values = true)]
    pub smtp_pass: Option<String>,

    /// Sender address (defaults to the SMTP username)
    #[arg(long, env = "NOTIFY_EMAIL_FROM")]
    pub email_from: Option<String>,

    /// Recipient address
    #[arg(long, env = "NOTIFY_EMAIL_TO")]
    pub email_to: Option<String>,
}
