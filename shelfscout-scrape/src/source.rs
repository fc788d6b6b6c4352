use async_trait::async_trait;
use shelfscout_http::HttpError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// One search-results page to fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub keyword: String,
    pub country: String,
    pub page: u32,
}

impl FetchRequest {
    pub fn new(keyword: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            country: country.into(),
            page: 1,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),
    #[error("upstream returned status {status}")]
    BadStatus { status: u16 },
    /// The request itself is unusable; retrying cannot help.
    #[error("request could not be built: {0}")]
    Request(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Request(_))
    }

    /// Short stable name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Timeout(_) => "timeout",
            FetchError::BadStatus { .. } => "bad_status",
            FetchError::Request(_) => "request",
        }
    }
}

impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Timeout(after) => FetchError::Timeout(after),
            HttpError::Network(msg) => FetchError::Transport(msg),
            HttpError::Status { status, .. } => FetchError::BadStatus {
                status: status.as_u16(),
            },
            HttpError::Url(msg) | HttpError::Build(msg) => FetchError::Request(msg),
        }
    }
}

/// Anything that can hand back the raw markup of a search-results page.
#[async_trait]
pub trait MarkupSource: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError>;
}

#[async_trait]
impl<S: MarkupSource + ?Sized> MarkupSource for Arc<S> {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        (**self).fetch(request).await
    }
}
