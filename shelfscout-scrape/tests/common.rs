#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shelfscout_common::observability::{LogConfig, init_logging};
use shelfscout_scrape::{FetchError, FetchRequest, MarkupSource};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "shelfscout-scrape-tests".to_string(),
            dir: Some(std::env::temp_dir().join("shelfscout-tests")),
            filter: "debug".to_string(),
            ..LogConfig::default()
        };
        init_logging(&config).unwrap_or_default()
    });
}

pub const ACME_MOUSE_PAGE: &str = r#"
<html><body><div class="s-main-slot">
  <div data-asin="B0MOUSE001">
    <img class="s-image" src="https://img/x.jpg">
    <h2 class="a-size-medium a-spacing-none a-color-base a-text-normal"><a href="/dp/B0MOUSE001"><span>Acme Mouse</span></a></h2>
    <i class="a-icon a-icon-star-small"><span class="a-icon-alt">4.5 out of 5 stars</span></i>
    <a aria-label="1,234 reviews" href="/dp/B0MOUSE001"><span>1,234</span></a>
  </div>
</div></body></html>
"#;

/// Plays back canned outcomes in order and counts every fetch.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<String, FetchError>>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<FetchRequest>>,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Result<String, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<FetchRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarkupSource for ScriptedSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Transport("script exhausted".into())))
    }
}
