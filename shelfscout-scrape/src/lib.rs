//! Keyword to product records: fetch through a [`MarkupSource`], retry
//! transient failures, extract.
//!
//! - [`ProxyTransport`] fetches marketplace pages through the scraping proxy
//! - [`fetch_with_retry`] is the bounded retry loop; its attempt counter
//!   lives and dies with one call
//! - [`ScrapeService`] validates the keyword, fetches and extracts
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use shelfscout_config::ShelfscoutConfigLoader;
//! use shelfscout_scrape::{ProxyTransport, RetryPolicy, ScrapeService};
//!
//! let cfg = ShelfscoutConfigLoader::new().load()?;
//! let service = ScrapeService::new(ProxyTransport::from_config(&cfg)?, cfg.proxy.country.clone())
//!     .with_retry(RetryPolicy::from_config(&cfg.scraping));
//! let products = service.scrape("wireless mouse").await?;
//! println!("{} products", products.len());
//! # Ok(()) }
//! ```

mod retry;
mod service;
mod source;
mod transport;

pub use retry::{RetryPolicy, fetch_with_retry};
pub use service::{ScrapeError, ScrapeService, validate_keyword};
pub use source::{FetchError, FetchRequest, MarkupSource};
pub use transport::ProxyTransport;
