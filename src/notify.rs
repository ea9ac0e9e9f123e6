//! Notification formatting and delivery.
//!
//! [`Dispatcher`] turns an entry and its resolved summary into a
//! [`Notification`] and hands it to a [`Notifier`]. Delivery failures are
//! logged and reported as `false`, never propagated: an entry counts as
//! handled once a send has been attempted.

use crate::config::SmtpConfig;
use crate::error::NotifyError;
use crate::models::{Entry, SummaryResult};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Outbound message transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Plain-text email over an SMTP relay with STARTTLS.
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn from_config(smtp: &SmtpConfig, timeout: Duration) -> Result<Self, NotifyError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
            .port(smtp.port)
            .timeout(Some(timeout));
        if let (Some(user), Some(pass)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from: smtp.from_mailbox()?,
            to: smtp.to_mailbox()?,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(level = "debug", skip_all, fields(%subject))]
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        self.mailer.send(msg).await?;
        Ok(())
    }
}

/// Emits each message as a log event; used when no SMTP relay is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(target: "notification", %subject, %body, "Notification");
        Ok(())
    }
}

/// A formatted message for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Body is `name`, the summary text, and the resolved URL, separated by
    /// blank lines. The text line stays (empty) when no summary was found.
    pub fn compose(subject_prefix: &str, entry: &Entry, summary: &SummaryResult) -> Self {
        Self {
            subject: format!("{subject_prefix}{}", entry.name),
            body: format!("{}\n\n{}\n\n{}", entry.name, summary.text, summary.source_url),
        }
    }
}

/// Formats and sends notifications, swallowing delivery failures.
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    subject_prefix: String,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, subject_prefix: impl Into<String>) -> Self {
        Self {
            notifier,
            subject_prefix: subject_prefix.into(),
        }
    }

    /// Send the notification for `entry`; returns whether delivery succeeded.
    #[instrument(level = "info", skip_all, fields(name = %entry.name))]
    pub async fn dispatch(&self, entry: &Entry, summary: &SummaryResult) -> bool {
        let note = Notification::compose(&self.subject_prefix, entry, summary);
        match self.notifier.send(&note.subject, &note.body).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Notification delivery failed");
                false
            }
        }
    }
}
