use scraper::{ElementRef, Html, Selector};
use shelfscout_common::ProductRecord;
use thiserror::Error;
use tracing::{debug, warn};

use crate::fields;
use crate::strategy::{self, Strategies, Strategy};
use crate::ExtractError;

/// Why a single fragment was dropped. Never escapes [`Extractor::extract`].
#[derive(Debug, Error, PartialEq)]
pub(crate) enum FragmentError {
    #[error("rating token {token:?} from strategy {strategy} is not a finite number")]
    Rating { strategy: String, token: String },
}

/// Turns a search-results document into validated [`ProductRecord`]s.
///
/// Stateless after construction; one instance can serve any number of
/// concurrent callers.
#[derive(Debug, Clone)]
pub struct Extractor {
    identity_attr: String,
    fragment: Selector,
    title: Vec<Strategy>,
    rating: Vec<Strategy>,
    image: Vec<Strategy>,
    review_count: Vec<Strategy>,
}

impl Extractor {
    /// Extractor for the default marketplace templates.
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_strategies(&Strategies::default())
    }

    pub fn with_strategies(strategies: &Strategies) -> Result<Self, ExtractError> {
        let attr = strategies.identity_attr.trim();
        if attr.is_empty() {
            return Err(ExtractError::NoStrategies("identity_attr"));
        }
        let fragment_css = format!("[{attr}]");
        let fragment = Selector::parse(&fragment_css).map_err(|e| ExtractError::Selector {
            field: "identity_attr",
            selector: fragment_css.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            identity_attr: attr.to_string(),
            fragment,
            title: strategy::compile("title", &strategies.title)?,
            rating: strategy::compile("rating", &strategies.rating)?,
            image: strategy::compile("image", &strategies.image)?,
            review_count: strategy::compile("review_count", &strategies.review_count)?,
        })
    }

    /// Extract records in document order. Never fails: markup that yields
    /// no fragments, or only unusable ones, produces an empty vector.
    pub fn extract(&self, markup: &str) -> Vec<ProductRecord> {
        let document = Html::parse_document(markup);
        let mut records = Vec::new();
        let mut seen = 0usize;

        for fragment in document.select(&self.fragment) {
            let Some(identity) = fragment
                .value()
                .attr(&self.identity_attr)
                .map(str::trim)
                .filter(|id| !id.is_empty())
            else {
                continue;
            };
            seen += 1;

            match self.extract_fragment(fragment) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {
                    debug!(target: "extract", %identity, "extract.fragment.incomplete");
                }
                Err(e) => {
                    warn!(target: "extract", %identity, error = %e, "extract.fragment.skipped");
                }
            }
        }

        debug!(
            target: "extract",
            fragments = seen,
            records = records.len(),
            "extract.done"
        );
        records
    }

    /// `Ok(None)` when a required field is missing or the rating is not positive.
    fn extract_fragment(
        &self,
        fragment: ElementRef<'_>,
    ) -> Result<Option<ProductRecord>, FragmentError> {
        let Some(title) = first_usable(&self.title, fragment, fields::title) else {
            return Ok(None);
        };

        let rating = match first_usable(&self.rating, fragment, fields::rating) {
            Some(Ok(value)) => value,
            Some(Err(token)) => {
                return Err(FragmentError::Rating {
                    strategy: self.rating_strategy_name(fragment),
                    token,
                });
            }
            None => return Ok(None),
        };
        // A zero rating disqualifies the listing just like a missing one.
        if rating <= 0.0 {
            return Ok(None);
        }

        let Some(image_url) = first_usable(&self.image, fragment, fields::image_url) else {
            return Ok(None);
        };

        let digits = first_usable(&self.review_count, fragment, fields::review_digits);
        let review_count = fields::review_count(digits.as_deref());

        Ok(Some(ProductRecord {
            title,
            rating,
            review_count,
            image_url,
        }))
    }

    fn rating_strategy_name(&self, fragment: ElementRef<'_>) -> String {
        self.rating
            .iter()
            .find(|s| s.values(fragment).any(|raw| fields::rating(&raw).is_some()))
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }
}

/// Walk strategies in order and return the first value `accept` keeps.
fn first_usable<T>(
    strategies: &[Strategy],
    fragment: ElementRef<'_>,
    accept: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    strategies
        .iter()
        .find_map(|s| s.values(fragment).find_map(|raw| accept(&raw)))
}
