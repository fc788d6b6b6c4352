//! HTTP surface of shelfscout.
//!
//! | Route              | Success body                     |
//! |--------------------|----------------------------------|
//! | `GET /api/scrape`  | JSON array of product records    |
//! | `GET /api/search`  | `SearchSummary` envelope         |
//! | `GET /healthz`     | empty `200`                      |
//!
//! Both search routes take `keyword` (required) and `page` (optional, from 1)
//! and are admitted per client through the shared [`RateGovernor`].

mod client_key;
mod error;
mod routes;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use shelfscout_governor::RateGovernor;
use shelfscout_scrape::{MarkupSource, ScrapeService};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use client_key::client_key;
pub use error::{ApiError, ErrorBody, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET};

/// Type-erased page source so tests and production share one router type.
pub type SharedSource = Arc<dyn MarkupSource>;

#[derive(Clone)]
pub struct AppState {
    scraper: Arc<ScrapeService<SharedSource>>,
    governor: Arc<RateGovernor>,
    trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(
        scraper: ScrapeService<SharedSource>,
        governor: Arc<RateGovernor>,
        trust_forwarded_for: bool,
    ) -> Self {
        Self {
            scraper: Arc::new(scraper),
            governor,
            trust_forwarded_for,
        }
    }

    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }
}

/// Build the router. Browsers may call it from `allowed_origins` only.
pub fn router(state: AppState, allowed_origins: &[String]) -> Result<Router> {
    let origins = allowed_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o.trim()).with_context(|| format!("invalid CORS origin {o:?}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET])
        .expose_headers([
            X_RATELIMIT_LIMIT,
            X_RATELIMIT_REMAINING,
            X_RATELIMIT_RESET,
            axum::http::header::RETRY_AFTER,
        ]);

    Ok(Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/api/scrape", get(routes::scrape))
        .route("/api/search", get(routes::search))
        .layer(cors)
        .with_state(state))
}
