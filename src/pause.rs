//! Injectable waiting.
//!
//! Request spacing and rate-limit backoff go through [`Pause`] so that tests
//! can record the requested delays instead of sleeping through them.

use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        trace!(?duration, "Pausing");
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_pause_advances_timer() {
        let start = tokio::time::Instant::now();
        TokioPause.pause(Duration::from_secs(60)).await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}
