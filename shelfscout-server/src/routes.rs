use axum::Json;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use shelfscout_common::{ProductRecord, SearchSummary};
use shelfscout_scrape::validate_keyword;
use std::net::SocketAddr;
use tracing::info;

use crate::AppState;
use crate::client_key::client_key;
use crate::error::{ApiError, X_RATELIMIT_REMAINING};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchParams {
    keyword: Option<String>,
    page: Option<String>,
}

struct Admitted {
    keyword: String,
    products: Vec<ProductRecord>,
    remaining: u32,
}

pub(crate) async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /api/scrape`: bare array of records.
pub(crate) async fn scrape(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let admitted = run_search(&state, peer, &headers, &params).await?;
    Ok(with_remaining(admitted.remaining, Json(admitted.products)))
}

/// `GET /api/search`: records wrapped in a [`SearchSummary`].
pub(crate) async fn search(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let Admitted {
        keyword,
        products,
        remaining,
    } = run_search(&state, peer, &headers, &params).await?;
    let summary = SearchSummary::new(keyword, products, remaining);
    Ok(with_remaining(remaining, Json(summary)))
}

/// Validate, admit, scrape. Invalid input is rejected before any quota is spent.
async fn run_search(
    state: &AppState,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: &HeaderMap,
    params: &SearchParams,
) -> Result<Admitted, ApiError> {
    let keyword = validate_keyword(params.keyword.as_deref().unwrap_or_default())?.to_string();
    let page = parse_page(params.page.as_deref())?;

    let key = client_key(
        headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.trust_forwarded_for,
    );
    let governor = &state.governor;
    if !governor.is_allowed(&key) {
        info!(target: "server", %key, %keyword, "server.rate_limited");
        return Err(ApiError::RateLimited {
            limit: governor.config().max_requests,
            remaining: governor.remaining(&key),
            reset: governor.time_until_reset(&key),
        });
    }

    info!(target: "server", %key, %keyword, page, "server.search");
    let products = state.scraper.scrape_page(&keyword, page).await?;
    Ok(Admitted {
        keyword,
        products,
        remaining: governor.remaining(&key),
    })
}

fn parse_page(raw: Option<&str>) -> Result<u32, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(1),
        Some(s) => s
            .parse::<u32>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or(ApiError::InvalidPage),
    }
}

fn with_remaining(remaining: u32, body: impl IntoResponse) -> Response {
    ([(X_RATELIMIT_REMAINING, remaining.to_string())], body).into_response()
}
