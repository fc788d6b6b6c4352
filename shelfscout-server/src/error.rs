use axum::Json;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use shelfscout_scrape::{FetchError, ScrapeError};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// JSON body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or blank keyword")]
    InvalidKeyword,
    #[error("page must be a positive integer")]
    InvalidPage,
    #[error("rate limit exceeded")]
    RateLimited {
        limit: u32,
        remaining: u32,
        reset: Duration,
    },
    #[error("upstream timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Internal(String),
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::InvalidKeyword => ApiError::InvalidKeyword,
            ScrapeError::InvalidPage => ApiError::InvalidPage,
            ScrapeError::Fetch(FetchError::Timeout(_)) => ApiError::Timeout(err.to_string()),
            ScrapeError::Fetch(_) | ScrapeError::Extraction(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidKeyword | ApiError::InvalidPage => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, details) = match self {
            ApiError::InvalidKeyword => (
                "Missing or invalid keyword parameter",
                "Please provide a valid search keyword".to_string(),
            ),
            ApiError::InvalidPage => (
                "Invalid page parameter",
                "page must be a positive integer".to_string(),
            ),
            ApiError::RateLimited { reset, .. } => (
                "Rate limit exceeded",
                format!("Please try again in {} seconds", ceil_secs(*reset)),
            ),
            ApiError::Timeout(_) => (
                "Request timeout",
                "The request took too long to complete".to_string(),
            ),
            ApiError::Internal(msg) => ("Internal server error", msg.clone()),
        };
        ErrorBody {
            error: error.to_string(),
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(target: "server", %status, error = %self, "server.request.failed");
        }
        let body = Json(self.body());

        match self {
            ApiError::RateLimited {
                limit,
                remaining,
                reset,
            } => {
                let reset = ceil_secs(reset).to_string();
                (
                    status,
                    [
                        (X_RATELIMIT_LIMIT, limit.to_string()),
                        (X_RATELIMIT_REMAINING, remaining.to_string()),
                        (X_RATELIMIT_RESET, reset.clone()),
                        (RETRY_AFTER, reset),
                    ],
                    body,
                )
                    .into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

/// Whole seconds, rounded up so clients never retry early.
pub(crate) fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_rounds_up() {
        assert_eq!(ceil_secs(Duration::ZERO), 0);
        assert_eq!(ceil_secs(Duration::from_millis(1)), 1);
        assert_eq!(ceil_secs(Duration::from_secs(60)), 60);
        assert_eq!(ceil_secs(Duration::from_millis(59_001)), 60);
    }

    #[test]
    fn scrape_errors_map_to_statuses() {
        let cases = [
            (ScrapeError::InvalidKeyword, StatusCode::BAD_REQUEST),
            (ScrapeError::InvalidPage, StatusCode::BAD_REQUEST),
            (
                ScrapeError::Fetch(FetchError::Timeout(Duration::from_secs(10))),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ScrapeError::Fetch(FetchError::BadStatus { status: 503 }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ScrapeError::Fetch(FetchError::Transport("reset".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ScrapeError::Extraction("worker panicked".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
