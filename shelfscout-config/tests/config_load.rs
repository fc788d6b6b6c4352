use shelfscout_common::observability::LogFormat;
use shelfscout_config::ShelfscoutConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
proxy:
  api_key: "${SCOUT_TEST_PROXY_KEY}"
  country: "de"
scraping:
  timeout_ms: 2500
  retries: 1
rate_limit:
  max_requests: 4
  window_secs: 10
server:
  bind: "127.0.0.1:9000"
  allowed_origins:
    - "http://localhost:5173"
logging:
  format: json
  stderr: false
"#;

#[test]
#[serial]
fn loads_file_and_expands_placeholders() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "shelfscout.yaml", FILE_YAML);

    let config = temp_env::with_var("SCOUT_TEST_PROXY_KEY", Some("secret-1"), || {
        ShelfscoutConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config")
    });

    assert_eq!(config.proxy.api_key, "secret-1");
    assert_eq!(config.proxy.country, "de");
    assert_eq!(config.scraping.timeout_ms, 2500);
    assert_eq!(config.scraping.retries, 1);
    // Untouched fields keep their defaults.
    assert_eq!(config.scraping.retry_delay_ms, 1000);
    assert_eq!(config.rate_limit.max_requests, 4);
    assert_eq!(config.server.allowed_origins, vec!["http://localhost:5173"]);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert!(!config.logging.stderr);
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "shelfscout.yaml", FILE_YAML);

    let config = temp_env::with_vars(
        [
            ("SCOUT_TEST_PROXY_KEY", Some("secret-1")),
            ("SHELFSCOUT__RATE_LIMIT__MAX_REQUESTS", Some("25")),
            ("SHELFSCOUT__SERVER__BIND", Some("0.0.0.0:3001")),
        ],
        || {
            ShelfscoutConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load config")
        },
    );

    assert_eq!(config.rate_limit.max_requests, 25);
    assert_eq!(config.server.bind, "0.0.0.0:3001");
}

#[test]
#[serial]
fn environment_strings_keep_their_text() {
    let config = temp_env::with_vars(
        [
            ("SHELFSCOUT__PROXY__API_KEY", Some("0012345678")),
            ("SHELFSCOUT__PROXY__COUNTRY", Some("true")),
            ("SHELFSCOUT__RATE_LIMIT__MAX_REQUESTS", Some("7")),
            ("SHELFSCOUT__SERVER__TRUST_FORWARDED_FOR", Some("true")),
        ],
        || ShelfscoutConfigLoader::new().load().expect("load config"),
    );

    assert_eq!(config.proxy.api_key, "0012345678");
    assert_eq!(config.proxy.country, "true");
    assert_eq!(config.rate_limit.max_requests, 7);
    assert!(config.server.trust_forwarded_for);
}

#[test]
#[serial]
fn placeholder_expanding_to_digits_fills_a_number() {
    let config = temp_env::with_vars(
        [
            ("SCOUT_TEST_WINDOW", Some("45")),
            ("SCOUT_TEST_PROXY_KEY", Some("987654")),
        ],
        || {
            ShelfscoutConfigLoader::new()
                .with_yaml_str(
                    "proxy:\n  api_key: \"${SCOUT_TEST_PROXY_KEY}\"\nrate_limit:\n  window_secs: \"${SCOUT_TEST_WINDOW}\"\n",
                )
                .load()
                .expect("load config")
        },
    );

    assert_eq!(config.proxy.api_key, "987654");
    assert_eq!(config.rate_limit.window_secs, 45);
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = ShelfscoutConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults load");

    assert_eq!(config.rate_limit.max_requests, 10);
    assert_eq!(config.server.bind, "127.0.0.1:3001");
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let res = ShelfscoutConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(res.is_err());
}

#[test]
#[serial]
fn zero_window_is_rejected() {
    let res = ShelfscoutConfigLoader::new()
        .with_yaml_str("rate_limit:\n  window_secs: 0\n")
        .load();
    assert!(res.is_err());
}
