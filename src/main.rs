//! # wiki_deaths_watch
//!
//! Watches a Wikipedia "Deaths in …" listing page and sends exactly one
//! notification for every newly appended person, with a short biography
//! taken from the preferred-language wiki when one exists.
//!
//! ## Usage
//!
//! ```sh
//! wiki_deaths_watch --page-url https://en.wikipedia.org/wiki/Deaths_in_December_2025
//! ```
//!
//! ## Architecture
//!
//! Every poll cycle runs the same pipeline, sequentially:
//! 1. **Classify**: decide from the page URL whether the page is the current month
//! 2. **Extract**: walk the listing markup into an ordered list of entries
//! 3. **Gate**: skip entries whose `name|link` key is already recorded
//! 4. **Resolve**: fetch a lead paragraph (secondary wiki first, then primary)
//! 5. **Notify**: send the message, then record and persist the key

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod classify;
mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod html;
mod models;
mod monitor;
mod notify;
mod pause;
mod resolve;
mod store;
#[cfg(test)]
mod testing;
mod tree;
mod utils;

use cli::Cli;
use config::Config;
use fetch::{HttpFetcher, LangLinksLookup, build_client};
use monitor::Monitor;
use notify::{LogNotifier, Notifier, SmtpNotifier};
use pause::TokioPause;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "wiki_deaths_watch starting up");

    let args = Cli::parse();
    debug!(?args.config, once = args.once, "Parsed CLI arguments");

    let config = Config::from_cli(&args).inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;
    info!(
        page = %config.page_url,
        state_file = %config.state_file.display(),
        secondary_lang = %config.secondary_lang,
        "Configuration loaded"
    );

    let client = build_client(&config.user_agent, config.http_timeout())?;
    let fetcher = Arc::new(HttpFetcher::new(client.clone()));
    let lookup = Arc::new(LangLinksLookup::new(
        client,
        config.api_url.clone(),
        config.secondary_lang.clone(),
    ));

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => {
            info!(host = %smtp.host, port = smtp.port, to = %smtp.to, "Email delivery enabled");
            Arc::new(SmtpNotifier::from_config(smtp, config.http_timeout())?)
        }
        None => {
            info!("No SMTP relay configured; notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let once = args.once;
    let monitor = Monitor::new(config, fetcher, lookup, notifier, Arc::new(TokioPause));

    if once {
        let report = monitor
            .run_cycle(chrono::Local::now().date_naive())
            .await
            .inspect_err(|e| error!(error = %e, "Cycle failed"))?;
        info!(
            discovered = report.discovered,
            notified = report.notified,
            delivery_failures = report.delivery_failures,
            "Single cycle complete"
        );
        return Ok(());
    }

    monitor.run_forever().await;
    info!("wiki_deaths_watch stopped");
    Ok(())
}
