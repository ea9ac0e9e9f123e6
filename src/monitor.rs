//! Poll-cycle orchestration.
//!
//! One cycle loads the seen-key store, fetches and classifies the listing
//! page, and walks its entries in document order. Each unseen entry is
//! resolved, announced, and recorded, strictly one after another; the store
//! is persisted after every entry so a restart never repeats finished work.
//!
//! [`Monitor::run_forever`] repeats cycles on a fixed interval. A failing
//! cycle is logged and retried on the next tick; it never ends the process.

use crate::classify::classify;
use crate::config::Config;
use crate::error::{FetchError, MonitorError};
use crate::extract::entries;
use crate::fetch::{Fetcher, InterlanguageLookup};
use crate::html::content_container;
use crate::models::CycleReport;
use crate::notify::{Dispatcher, Notifier};
use crate::pause::Pause;
use crate::resolve::SummaryResolver;
use crate::store::SeenStore;
use crate::utils::truncate_for_log;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

pub struct Monitor {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    resolver: SummaryResolver,
    dispatcher: Dispatcher,
    pause: Arc<dyn Pause>,
}

impl Monitor {
    pub fn new(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        lookup: Arc<dyn InterlanguageLookup>,
        notifier: Arc<dyn Notifier>,
        pause: Arc<dyn Pause>,
    ) -> Self {
        let resolver = SummaryResolver::from_config(&config, fetcher.clone(), lookup, pause.clone());
        let dispatcher = Dispatcher::new(notifier, config.subject_prefix.clone());
        Self {
            config,
            fetcher,
            resolver,
            dispatcher,
            pause,
        }
    }

    /// Run one poll cycle as of `today`.
    ///
    /// # Returns
    ///
    /// Counters for the cycle. Summary and delivery failures are counted,
    /// not returned.
    ///
    /// # Errors
    ///
    /// A listing page that cannot be fetched or is not 200, or a state file
    /// that cannot be read or written.
    #[instrument(level = "info", skip_all, fields(page = %self.config.page_url, %today))]
    pub async fn run_cycle(&self, today: NaiveDate) -> Result<CycleReport, MonitorError> {
        let mut report = CycleReport::default();
        let mut store = SeenStore::load(&self.config.state_file).await?;

        let page_url = self.config.page_url.as_str();
        let page = self.fetcher.fetch(page_url).await?;
        if !page.is_ok() {
            return Err(FetchError::Status {
                url: page_url.to_string(),
                status: page.status,
            }
            .into());
        }

        let Some(container) = content_container(&page.body) else {
            warn!("Listing page has no content container; nothing to do");
            return Ok(report);
        };

        let classification = classify(page_url, today);
        debug!(
            month = ?classification.month,
            year = ?classification.year,
            is_current = classification.is_current,
            "Walking listing page"
        );

        for entry in entries(&container, classification) {
            report.discovered += 1;
            let key = entry.dedup_key();
            if store.contains(&key) {
                report.already_seen += 1;
                continue;
            }

            self.pause.pause(self.config.entry_delay()).await;
            let summary = self.resolver.resolve(&entry.link).await;
            info!(
                name = %entry.name,
                link = %entry.link,
                url = %summary.source_url,
                text = %truncate_for_log(&summary.text, 200),
                "New entry found"
            );

            if !self.dispatcher.dispatch(&entry, &summary).await {
                report.delivery_failures += 1;
            }
            if summary.is_empty() {
                report.unresolved += 1;
            }
            report.notified += 1;

            store.add(key);
            store.persist().await?;
        }

        Ok(report)
    }

    /// Poll until Ctrl-C, sleeping `poll_interval` after each cycle.
    ///
    /// The signal listener is installed once, up front. A Ctrl-C that lands
    /// mid-cycle is held until the cycle finishes, so an entry is never cut
    /// off between its notification and its persist.
    pub async fn run_forever(&self) {
        let ctrl_c = tokio::spawn(tokio::signal::ctrl_c());
        self.run_until(async move {
            match ctrl_c.await {
                Ok(Ok(())) => info!("Shutdown requested"),
                Ok(Err(e)) => {
                    warn!(error = %e, "Could not listen for Ctrl-C; polling until killed");
                    std::future::pending::<()>().await;
                }
                Err(e) => {
                    warn!(error = %e, "Ctrl-C listener stopped; polling until killed");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await;
    }

    /// Poll until `shutdown` completes.
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Checked only between cycles; a running cycle always
    ///   finishes first.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let interval = self.config.poll_interval();
        info!(?interval, page = %self.config.page_url, "Watching listing page");
        tokio::pin!(shutdown);

        loop {
            let started = Instant::now();
            match self.run_cycle(Local::now().date_naive()).await {
                Ok(report) => info!(
                    discovered = report.discovered,
                    already_seen = report.already_seen,
                    notified = report.notified,
                    delivery_failures = report.delivery_failures,
                    unresolved = report.unresolved,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Cycle complete"
                ),
                Err(e) => error!(error = %e, "Cycle failed; retrying next interval"),
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => return,
                _ = self.pause.pause(interval) => {}
            }
        }
    }
}
