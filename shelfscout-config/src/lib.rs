//! Loader for shelfscout configuration with YAML + environment overlays.
//!
//! Sources are merged in order (YAML files/snippets, then `SHELFSCOUT__*`
//! environment variables), `${VAR}` placeholders are expanded, and the
//! result is deserialized into [`ShelfscoutConfig`]. Every section has
//! defaults, so an empty document is a valid configuration.
//!
//! Environment keys use `__` between path segments, e.g.
//! `SHELFSCOUT__PROXY__API_KEY` or `SHELFSCOUT__RATE_LIMIT__MAX_REQUESTS`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use shelfscout_common::observability::LogConfig;
use std::path::Path;
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
pub const ENV_PREFIX: &str = "SHELFSCOUT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShelfscoutConfig {
    pub proxy: ProxyConfig,
    pub scraping: ScrapingConfig,
    pub rate_limit: RateLimitConfig,
    pub server: ServerConfig,
    pub logging: LogConfig,
}

/// Scraping proxy the marketplace page is fetched through.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub api_key: String,
    pub endpoint: String,
    /// Country hint forwarded to the proxy.
    pub country: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://proxy.scrapeops.io/v1/".into(),
            country: "us".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    pub marketplace_base_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    pub retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            marketplace_base_url: "https://www.amazon.com".into(),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:136.0) Gecko/20100101 Firefox/136.0".into(),
            timeout_ms: 10_000,
            retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}

impl ScrapingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
    /// How often idle rate keys are swept from memory.
    pub eviction_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_secs: 60,
            eviction_interval_secs: 300,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub allowed_origins: Vec<String>,
    /// Key rate limits on the first `x-forwarded-for` hop instead of the peer address.
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".into(),
            allowed_origins: vec!["http://localhost:3000".into()],
            trust_forwarded_for: false,
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

fn validate(cfg: &ShelfscoutConfig) -> Result<(), ConfigError> {
    if cfg.rate_limit.max_requests == 0 {
        return Err(ConfigError::Message(
            "rate_limit.max_requests must be positive".into(),
        ));
    }
    if cfg.rate_limit.window_secs == 0 {
        return Err(ConfigError::Message(
            "rate_limit.window_secs must be positive".into(),
        ));
    }
    if cfg.rate_limit.eviction_interval_secs == 0 {
        return Err(ConfigError::Message(
            "rate_limit.eviction_interval_secs must be positive".into(),
        ));
    }
    if cfg.scraping.timeout_ms == 0 {
        return Err(ConfigError::Message(
            "scraping.timeout_ms must be positive".into(),
        ));
    }
    Ok(())
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ShelfscoutConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ShelfscoutConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ShelfscoutConfigLoader {
    /// Start from defaults plus `SHELFSCOUT__` environment overrides.
    ///
    /// ```
    /// use shelfscout_config::ShelfscoutConfigLoader;
    ///
    /// let config = ShelfscoutConfigLoader::new()
    ///     .with_yaml_str("{}")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.rate_limit.max_requests, 10);
    /// assert_eq!(config.rate_limit.window_secs, 60);
    /// assert_eq!(config.scraping.retries, 3);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format follows the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so deployments can rely on the
    /// environment alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use shelfscout_config::ShelfscoutConfigLoader;
    ///
    /// let cfg = ShelfscoutConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// rate_limit:
    ///   max_requests: 2
    ///   window_secs: 30
    /// server:
    ///   bind: "0.0.0.0:8080"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.rate_limit.max_requests, 2);
    /// assert_eq!(cfg.rate_limit.window().as_secs(), 30);
    /// assert_eq!(cfg.server.bind, "0.0.0.0:8080");
    /// assert_eq!(cfg.proxy.country, "us");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Build the merged sources, expand `${VAR}` placeholders and deserialize.
    ///
    /// ```
    /// use shelfscout_config::ShelfscoutConfigLoader;
    ///
    /// unsafe { std::env::set_var("SCOUT_DOC_PROXY_KEY", "injected-from-env"); }
    ///
    /// let config = ShelfscoutConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// proxy:
    ///   api_key: "${SCOUT_DOC_PROXY_KEY}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.proxy.api_key, "injected-from-env");
    ///
    /// unsafe { std::env::remove_var("SCOUT_DOC_PROXY_KEY"); }
    /// ```
    pub fn load(self) -> Result<ShelfscoutConfig, ConfigError> {
        // Environment goes last so it overrides every file source.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        // Env values stay strings until here; the typed pass through `config`
        // parses numbers and booleans only where a field asks for them.
        let typed: ShelfscoutConfig = Config::try_from(&v)?.try_deserialize()?;
        validate(&typed)?;
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_inside_nested_sections() {
        temp_env::with_vars([("KEY", Some("k-123")), ("ORIGIN", Some("http://a"))], || {
            let mut v = json!({
                "proxy": { "api_key": "${KEY}" },
                "server": { "allowed_origins": ["${ORIGIN}", "http://b"] },
                "rate_limit": { "max_requests": 5 }
            });
            expand_env_in_value(&mut v);
            assert_eq!(v["proxy"]["api_key"], json!("k-123"));
            assert_eq!(v["server"]["allowed_origins"], json!(["http://a", "http://b"]));
            assert_eq!(v["rate_limit"]["max_requests"], json!(5));
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${SHELFSCOUT_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${SHELFSCOUT_DOES_NOT_EXIST}"));
    }

    #[test]
    fn rejects_zero_capacity() {
        let mut cfg = ShelfscoutConfig::default();
        cfg.rate_limit.max_requests = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn rejects_zero_window() {
        let mut cfg = ShelfscoutConfig::default();
        cfg.rate_limit.window_secs = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = ShelfscoutConfig::default();
        assert!(validate(&cfg).is_ok());
        assert_eq!(cfg.scraping.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.scraping.retry_delay(), Duration::from_secs(1));
        assert_eq!(cfg.server.allowed_origins, vec!["http://localhost:3000"]);
    }
}
