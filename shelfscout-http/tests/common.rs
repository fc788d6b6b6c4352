use std::sync::OnceLock;

use shelfscout_common::observability::{LogConfig, LogFormat};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "shelfscout-tests".to_string(),
            dir: Some(std::env::temp_dir().join("shelfscout-tests")),
            stderr: true,
            format: if std::env::var("SHELFSCOUT_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            filter: "debug".to_string(),
        };

        shelfscout_common::observability::init_logging(&config).unwrap_or_default()
    });
}
