use shelfscout_config::ScrapingConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::source::{FetchError, FetchRequest, MarkupSource};

/// Bounded retry with a fixed pause between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &ScrapingConfig) -> Self {
        Self {
            max_retries: cfg.retries,
            delay: cfg.retry_delay(),
        }
    }
}

/// Fetch `request`, retrying retryable failures up to `policy.max_retries`
/// times. The last error is returned unchanged once attempts run out.
///
/// Dropping the returned future abandons any pending attempt or pause.
pub async fn fetch_with_retry<S>(
    source: &S,
    request: &FetchRequest,
    policy: RetryPolicy,
) -> Result<String, FetchError>
where
    S: MarkupSource + ?Sized,
{
    let mut attempt = 0usize;
    loop {
        match source.fetch(request).await {
            Ok(markup) => {
                if attempt > 0 {
                    info!(
                        target: "scrape",
                        keyword = %request.keyword,
                        retries = attempt,
                        "scrape.recovered"
                    );
                }
                return Ok(markup);
            }
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    target: "scrape",
                    keyword = %request.keyword,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = policy.delay.as_millis() as u64,
                    kind = err.kind(),
                    error = %err,
                    "scrape.retrying"
                );
                sleep(policy.delay).await;
            }
            Err(err) => {
                warn!(
                    target: "scrape",
                    keyword = %request.keyword,
                    attempts = attempt + 1,
                    kind = err.kind(),
                    error = %err,
                    "scrape.fetch_failed"
                );
                return Err(err);
            }
        }
    }
}
