use shelfscout_common::ProductRecord;
use shelfscout_extract::{Extractor, shared_extractor};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

use crate::retry::{RetryPolicy, fetch_with_retry};
use crate::source::{FetchError, FetchRequest, MarkupSource};

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("keyword must not be blank")]
    InvalidKeyword,
    #[error("page must be 1 or greater")]
    InvalidPage,
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("extraction did not complete: {0}")]
    Extraction(String),
}

/// Trimmed keyword, or [`ScrapeError::InvalidKeyword`] when nothing is left.
pub fn validate_keyword(raw: &str) -> Result<&str, ScrapeError> {
    let keyword = raw.trim();
    if keyword.is_empty() {
        return Err(ScrapeError::InvalidKeyword);
    }
    Ok(keyword)
}

/// Keyword in, validated records out.
pub struct ScrapeService<S> {
    source: S,
    extractor: Arc<Extractor>,
    retry: RetryPolicy,
    country: String,
}

impl<S: MarkupSource> ScrapeService<S> {
    pub fn new(source: S, country: impl Into<String>) -> Self {
        Self {
            source,
            extractor: shared_extractor(),
            retry: RetryPolicy::default(),
            country: country.into(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// First results page for `keyword`.
    pub async fn scrape(&self, keyword: &str) -> Result<Vec<ProductRecord>, ScrapeError> {
        self.scrape_page(keyword, 1).await
    }

    pub async fn scrape_page(
        &self,
        keyword: &str,
        page: u32,
    ) -> Result<Vec<ProductRecord>, ScrapeError> {
        let keyword = validate_keyword(keyword)?;
        if page == 0 {
            return Err(ScrapeError::InvalidPage);
        }

        let started = Instant::now();
        let request = FetchRequest::new(keyword, self.country.as_str()).with_page(page);
        let markup = fetch_with_retry(&self.source, &request, self.retry).await?;
        let markup_len = markup.len();

        // Parsing is CPU bound and the DOM is not Send; keep it off the async workers.
        let extractor = Arc::clone(&self.extractor);
        let products = tokio::task::spawn_blocking(move || extractor.extract(&markup))
            .await
            .map_err(|e| ScrapeError::Extraction(e.to_string()))?;

        info!(
            target: "scrape",
            keyword,
            page,
            markup_len,
            products = products.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape.done"
        );
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl MarkupSource for Offline {
        async fn fetch(&self, _request: &FetchRequest) -> Result<String, FetchError> {
            Err(FetchError::Transport("offline".into()))
        }
    }

    #[test]
    fn services_share_the_built_in_extractor() {
        let a = ScrapeService::new(Offline, "us");
        let b = ScrapeService::new(Offline, "de");
        assert!(Arc::ptr_eq(&a.extractor, &b.extractor));
    }

    #[test]
    fn keywords_are_trimmed() {
        assert_eq!(validate_keyword("  wireless mouse ").unwrap(), "wireless mouse");
        assert!(matches!(
            validate_keyword(" \t\n"),
            Err(ScrapeError::InvalidKeyword)
        ));
        assert!(matches!(validate_keyword(""), Err(ScrapeError::InvalidKeyword)));
    }
}
