//! Fetching search pages through the scraping proxy.
//!
//! The marketplace URL is handed to the proxy as the `url` query parameter;
//! the proxy performs the actual request from the configured country.
//! Remote script rendering is always disabled.

use async_trait::async_trait;
use shelfscout_config::ShelfscoutConfig;
use shelfscout_http::{Auth, HttpClient, RequestOpts};
use std::borrow::Cow;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::source::{FetchError, FetchRequest, MarkupSource};

#[derive(Clone, Debug)]
pub struct ProxyTransport {
    http: HttpClient,
    api_key: String,
    marketplace: Url,
}

impl ProxyTransport {
    pub fn new(
        proxy_endpoint: &str,
        api_key: impl Into<String>,
        marketplace_base: &str,
    ) -> Result<Self, FetchError> {
        let http = HttpClient::new(proxy_endpoint)?;
        let marketplace =
            Url::parse(marketplace_base).map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            marketplace,
        })
    }

    pub fn from_config(cfg: &ShelfscoutConfig) -> Result<Self, FetchError> {
        Self::new(
            &cfg.proxy.endpoint,
            cfg.proxy.api_key.clone(),
            &cfg.scraping.marketplace_base_url,
        )?
        .with_timeout(cfg.scraping.timeout())
        .with_user_agent(&cfg.scraping.user_agent)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Result<Self, FetchError> {
        self.http = self.http.with_user_agent(user_agent)?;
        Ok(self)
    }

    /// Marketplace search URL for `request`, e.g. `https://shop/s?k=wireless+mouse&page=1`.
    pub fn target_url(&self, request: &FetchRequest) -> Result<Url, FetchError> {
        let mut url = self
            .marketplace
            .join("/s")
            .map_err(|e| FetchError::Request(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("k", &request.keyword)
            .append_pair("page", &request.page.to_string());
        Ok(url)
    }
}

#[async_trait]
impl MarkupSource for ProxyTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let target = self.target_url(request)?;
        debug!(
            target: "scrape",
            keyword = %request.keyword,
            page = request.page,
            %target,
            "scrape.proxy.fetch"
        );

        let opts = RequestOpts {
            query: Some(vec![
                ("url", Cow::Owned(target.to_string())),
                ("country", Cow::Borrowed(request.country.as_str())),
                ("render_js", Cow::Borrowed("false")),
            ]),
            auth: Some(Auth::Query {
                name: "api_key",
                value: Cow::Borrowed(self.api_key.as_str()),
            }),
            ..Default::default()
        };
        Ok(self.http.get_text("", opts).await?)
    }
}
