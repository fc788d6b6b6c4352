//! Ordered selection strategies per field.
//!
//! A strategy is a selector (which nodes inside a fragment qualify) paired
//! with a [`Source`] (what to read from a qualifying node). Each field owns
//! an ordered list, most template-specific first; the extractor walks the
//! list and keeps the first usable value.

use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::ExtractError;

/// Where a strategy reads its raw value from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Concatenated descendant text.
    Text,
    /// Value of the named attribute.
    Attr(String),
}

/// Uncompiled strategy, as written in tables or configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub name: String,
    pub selector: String,
    pub source: Source,
}

impl StrategySpec {
    pub fn text(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            source: Source::Text,
        }
    }

    pub fn attr(name: &str, selector: &str, attr: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            source: Source::Attr(attr.to_string()),
        }
    }
}

/// Strategy lists for every extracted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategies {
    /// Attribute whose non-empty value marks a product fragment.
    pub identity_attr: String,
    pub title: Vec<StrategySpec>,
    pub rating: Vec<StrategySpec>,
    pub image: Vec<StrategySpec>,
    pub review_count: Vec<StrategySpec>,
}

impl Default for Strategies {
    /// Search-results templates of the marketplace. Electronics listings
    /// use the medium list heading, consumables the base-plus grid heading.
    fn default() -> Self {
        Self {
            identity_attr: "data-asin".to_string(),
            title: vec![
                StrategySpec::text(
                    "electronics-heading",
                    "h2.a-size-medium.a-spacing-none.a-color-base.a-text-normal span",
                ),
                StrategySpec::text(
                    "consumables-heading",
                    "h2.a-size-base-plus.a-spacing-none.a-color-base.a-text-normal span",
                ),
                StrategySpec::text("heading-link", "h2 a span"),
                StrategySpec::text("heading-any", "h2 span"),
            ],
            rating: vec![
                StrategySpec::text("star-small-alt", ".a-icon-star-small .a-icon-alt"),
                StrategySpec::text("star-alt", "i.a-icon-star .a-icon-alt"),
                StrategySpec::attr(
                    "stars-label",
                    "[aria-label*=\"out of 5 stars\"]",
                    "aria-label",
                ),
                StrategySpec::text("icon-alt", "span.a-icon-alt"),
            ],
            image: vec![
                StrategySpec::attr("s-image-src", "img.s-image", "src"),
                StrategySpec::attr("s-image-lazy", "img.s-image", "data-src"),
                StrategySpec::attr(
                    "latency-image",
                    "img[data-image-latency=\"s-product-image\"]",
                    "src",
                ),
                StrategySpec::attr("image-container", ".s-product-image-container img", "src"),
            ],
            review_count: vec![
                StrategySpec::text(
                    "reviews-block-text",
                    "[data-cy=\"reviews-block\"] .a-size-base.s-underline-text",
                ),
                StrategySpec::attr(
                    "reviews-label",
                    "[aria-label$=\"reviews\"], [aria-label$=\"ratings\"]",
                    "aria-label",
                ),
                StrategySpec::text(
                    "customer-reviews-link",
                    "a[href*=\"customerReviews\"] span.s-underline-text",
                ),
            ],
        }
    }
}

/// Compiled strategy.
#[derive(Debug, Clone)]
pub(crate) struct Strategy {
    pub(crate) name: String,
    selector: Selector,
    source: Source,
}

impl Strategy {
    /// Raw values this strategy reads inside `fragment`, in document order.
    pub(crate) fn values<'a>(
        &'a self,
        fragment: ElementRef<'a>,
    ) -> impl Iterator<Item = String> + 'a {
        fragment
            .select(&self.selector)
            .filter_map(move |el| match &self.source {
                Source::Text => Some(el.text().collect::<String>()),
                Source::Attr(name) => el.value().attr(name).map(str::to_string),
            })
    }
}

pub(crate) fn compile(field: &'static str, specs: &[StrategySpec]) -> Result<Vec<Strategy>, ExtractError> {
    if specs.is_empty() {
        return Err(ExtractError::NoStrategies(field));
    }
    specs
        .iter()
        .map(|spec| {
            let selector = Selector::parse(&spec.selector).map_err(|e| ExtractError::Selector {
                field,
                selector: spec.selector.clone(),
                reason: e.to_string(),
            })?;
            Ok(Strategy {
                name: spec.name.clone(),
                selector,
                source: spec.source.clone(),
            })
        })
        .collect()
}
