//! Minimal HTTP transport with safe logging and query/header auth.
//!
//! - One attempt per call; retry policy belongs to the caller
//! - Request options: headers, `Auth`, query params, timeout
//! - Redacts sensitive query params and never logs secret values
//! - Distinguishes timeouts, connection failures and non-2xx statuses
//! - Optional *raw* request/response logging via `SHELFSCOUT_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), shelfscout_http::HttpError> {
//! let client = shelfscout_http::HttpClient::new("https://example.com")?;
//! let page: String = client
//!     .get_text("s", shelfscout_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated) and final errors, plus raw
//! request/response lines (target `http.raw`) when `SHELFSCOUT_HTTP_RAW=1`.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, StatusCode, Url};
use std::borrow::Cow;
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

pub use reqwest::StatusCode as HttpStatus;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "SHELFSCOUT_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_MAX: usize = 500;
const REDACTED: &str = "<redacted>";

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_param(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "apikey"
            | "token"
            | "secret"
            | "client_secret"
    )
}

/// Copy of `url` with secret query values replaced, safe to log.
fn redact_url(url: &Url) -> Url {
    let mut out = url.clone();
    if url.query().is_none() {
        return out;
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if is_secret_param(&k) {
                REDACTED.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{method}")];
    for (name, val) in headers.iter() {
        let v = if name.as_str().eq_ignore_ascii_case("authorization") {
            REDACTED.to_string()
        } else {
            val.to_str().unwrap_or("").to_string()
        };
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    parts.push(format!("'{}'", redact_url(url).as_str()));
    parts.join(" ")
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Status {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the transport.
///
/// ```
/// use shelfscout_http::Auth;
/// use std::borrow::Cow;
///
/// let auth = Auth::Query { name: "api_key", value: Cow::Borrowed("k") };
/// match auth {
///     Auth::Query { name, .. } => assert_eq!(name, "api_key"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Custom header (e.g. `X-Api-Key`)
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    /// Auth via query param; the value is redacted in every log line.
    Query {
        name: &'a str,
        value: Cow<'a, str>,
    },
    None,
}

/// Per-request tuning knobs.
///
/// ```
/// use shelfscout_http::RequestOpts;
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     query: Some(vec![("k", Cow::Borrowed("wireless mouse"))]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

// ==============================
// Client
// ==============================

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    user_agent: Option<HeaderValue>,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use shelfscout_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://proxy.example.com/v1/")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(10));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(10),
            user_agent: None,
        })
    }

    /// Override the default per-request timeout.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Send this `User-Agent` on every request.
    pub fn with_user_agent(mut self, ua: &str) -> Result<Self, HttpError> {
        let value = HeaderValue::from_str(ua)
            .map_err(|e| HttpError::Build(format!("invalid user agent: {e}")))?;
        self.user_agent = Some(value);
        Ok(self)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET a text body (HTML, usually). Non-2xx responses become
    /// [`HttpError::Status`].
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        self.request_text(Method::GET, path, opts).await
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    async fn request_text(
        &self,
        method: Method,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<String, HttpError> {
        let mut url = self.resolve(path, opts.allow_absolute)?;

        // Query params are written into the URL so logs and curl see exactly what is sent.
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(q) = &opts.query {
                for (k, v) in q {
                    pairs.append_pair(k, v);
                }
            }
            if let Some(Auth::Query { name, value }) = &opts.auth {
                pairs.append_pair(name, &sanitize_secret(value)?);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let mut headers = opts.headers.clone().unwrap_or_default();
        if let Some(ua) = &self.user_agent {
            headers.entry(USER_AGENT).or_insert_with(|| ua.clone());
        }

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout)
            .headers(headers.clone());
        if let Some(Auth::Header { name, value }) = &opts.auth {
            rb = rb.header(name, value);
        }

        let auth_kind = match &opts.auth {
            Some(Auth::Header { .. }) => "header",
            Some(Auth::Query { .. }) => "query",
            Some(Auth::None) | None => "none",
        };
        let req_id = uuid::Uuid::new_v4().simple().to_string();
        let safe_url = redact_url(&url);

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            url=%safe_url,
            timeout_ms=timeout.as_millis() as u64,
            auth_kind,
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&method, &url, &headers);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let t0 = Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let e = classify(err, timeout);
            tracing::warn!(req_id=%req_id, error=%e, "http.send_failed");
            e
        })?;
        let status = resp.status();
        let resp_headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            let e = classify(err, timeout);
            tracing::warn!(req_id=%req_id, %status, error=%e, "http.body_failed");
            e
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let upstream_id = resp_headers
            .get("x-request-id")
            .or_else(|| resp_headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            x_request_id=%upstream_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let truncated = bytes.len() > RAW_MAX_BODY;
            let end = bytes.len().min(RAW_MAX_BODY);
            let text = String::from_utf8_lossy(&bytes[..end]);
            tracing::info!(
                target: "http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                body=%text,
                truncated
            );
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        if status.is_success() {
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }

        tracing::warn!(
            req_id=%req_id,
            %status,
            x_request_id=%upstream_id,
            body_snippet=%snippet,
            "http.error"
        );
        Err(HttpError::Status {
            status,
            message: snippet,
            request_id: upstream_id,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn classify(err: reqwest::Error, timeout: Duration) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout(timeout)
    } else if err.is_builder() {
        HttpError::Build(err.to_string())
    } else {
        HttpError::Network(err.to_string())
    }
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

/// Trim quotes/whitespace that creep in from env files and reject control bytes.
fn sanitize_secret(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build("secret contains control characters".into()));
    }
    Ok(s)
}
