//! Resilient product extraction from marketplace search-results markup.
//!
//! - Fragments are elements carrying a non-empty product identity attribute
//!   (`data-asin` by default)
//! - Every field is read through an ordered list of strategies; the first
//!   usable value wins and later strategies are not consulted
//! - A fragment becomes a [`ProductRecord`] only with a title, a positive
//!   rating and a real (non `data:`) image URL; everything else is skipped
//! - Markup never causes an error: broken documents yield zero records
//!
//! ```
//! use shelfscout_extract::Extractor;
//!
//! let html = r#"
//!   <div data-asin="B01">
//!     <h2 class="a-size-medium a-spacing-none a-color-base a-text-normal"><span>Acme Mouse</span></h2>
//!     <i class="a-icon a-icon-star-small"><span class="a-icon-alt">4.5 out of 5 stars</span></i>
//!     <img class="s-image" src="https://img/x.jpg">
//!     <a aria-label="1,234 reviews" href="/reviews"></a>
//!   </div>"#;
//!
//! let records = Extractor::new().unwrap().extract(html);
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].title, "Acme Mouse");
//! assert_eq!(records[0].rating, 4.5);
//! assert_eq!(records[0].review_count, 1234);
//! ```

mod extractor;
mod fields;
pub mod strategy;

use std::sync::{Arc, LazyLock};

use shelfscout_common::ProductRecord;
use thiserror::Error;

pub use extractor::Extractor;
pub use strategy::{Source, Strategies, StrategySpec};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid {field} selector {selector:?}: {reason}")]
    Selector {
        field: &'static str,
        selector: String,
        reason: String,
    },
    #[error("no strategies configured for {0}")]
    NoStrategies(&'static str),
}

static DEFAULT_EXTRACTOR: LazyLock<Arc<Extractor>> =
    LazyLock::new(|| Arc::new(Extractor::new().expect("built-in strategy tables compile")));

/// Shared extractor for the built-in templates.
pub fn default_extractor() -> &'static Extractor {
    &DEFAULT_EXTRACTOR
}

/// Handle to the same built-in extractor, for owners that need an `Arc`.
pub fn shared_extractor() -> Arc<Extractor> {
    Arc::clone(&*DEFAULT_EXTRACTOR)
}

/// Extract with the built-in templates.
pub fn extract_products(markup: &str) -> Vec<ProductRecord> {
    DEFAULT_EXTRACTOR.extract(markup)
}
