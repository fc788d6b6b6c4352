//! Types and utilities shared across shelfscout crates.
//!
//! This crate holds the normalized listing record every other crate speaks,
//! the search envelope served by the HTTP layer, and the tracing
//! initialiser used by binaries and integration tests. It stays
//! dependency-light so the extractor and governor can depend on it freely.
//!
//! # Overview
//!
//! - [`ProductRecord`]: one validated product listing
//! - [`SearchSummary`]: keyword + records + remaining quota envelope
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use shelfscout_common::ProductRecord;
//!
//! let record = ProductRecord {
//!     title: "Acme Mouse".into(),
//!     rating: 4.5,
//!     review_count: 1234,
//!     image_url: "https://img/x.jpg".into(),
//! };
//! let json = serde_json::to_value(&record).unwrap();
//! assert_eq!(json["reviewCount"], 1234);
//! assert_eq!(json["imageUrl"], "https://img/x.jpg");
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// A single product listing extracted from a search results page.
///
/// Records are only ever built by the extractor after the emission rule
/// holds: non-empty `title`, `rating > 0`, non-empty `image_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub title: String,
    /// Star rating as printed by the marketplace. Not clamped to `[0, 5]`.
    pub rating: f64,
    /// Number of reviews; `0` when the listing shows no parseable count.
    pub review_count: u64,
    pub image_url: String,
}

/// Envelope returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSummary {
    pub keyword: String,
    pub total_results: usize,
    pub products: Vec<ProductRecord>,
    pub remaining_requests: u32,
}

impl SearchSummary {
    pub fn new(keyword: impl Into<String>, products: Vec<ProductRecord>, remaining: u32) -> Self {
        Self {
            keyword: keyword.into(),
            total_results: products.len(),
            products,
            remaining_requests: remaining,
        }
    }
}
