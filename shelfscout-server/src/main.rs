use anyhow::{Context, Result};
use clap::Parser;
use shelfscout_common::observability::init_logging;
use shelfscout_config::{ShelfscoutConfig, ShelfscoutConfigLoader};
use shelfscout_governor::{GovernorConfig, RateGovernor};
use shelfscout_scrape::{ProxyTransport, RetryPolicy, ScrapeService};
use shelfscout_server::{AppState, SharedSource, router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = "shelfscout.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "shelfscout",
    about = "Marketplace search scraper with per-client rate limiting"
)]
struct Cli {
    /// YAML config file. Without it `shelfscout.yaml` is used when present.
    #[arg(long, short, env = "SHELFSCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Override `server.bind` (host:port).
    #[arg(long, env = "SHELFSCOUT_BIND")]
    bind: Option<String>,
}

fn load_config(cli: &Cli) -> Result<ShelfscoutConfig> {
    let loader = match &cli.config {
        Some(path) => ShelfscoutConfigLoader::new().with_file(path),
        None => ShelfscoutConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    let mut cfg = loader.load().context("loading configuration")?;
    if let Some(bind) = &cli.bind {
        cfg.server.bind = bind.clone();
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;

    let log_path = init_logging(&cfg.logging)?;
    info!(log = %log_path.display(), "shelfscout.starting");
    if cfg.proxy.api_key.trim().is_empty() {
        warn!("proxy.api_key is empty; the proxy will reject every fetch");
    }

    let governor = Arc::new(RateGovernor::new(GovernorConfig {
        max_requests: cfg.rate_limit.max_requests,
        window: cfg.rate_limit.window(),
    })?);
    let shutdown = CancellationToken::new();
    let eviction = governor.spawn_eviction(cfg.rate_limit.eviction_interval(), shutdown.clone());

    let source: SharedSource =
        Arc::new(ProxyTransport::from_config(&cfg).context("building proxy transport")?);
    let scraper = ScrapeService::new(source, cfg.proxy.country.clone())
        .with_retry(RetryPolicy::from_config(&cfg.scraping));
    let state = AppState::new(scraper, governor, cfg.server.trust_forwarded_for);
    let app = router(state, &cfg.server.allowed_origins)?;

    let addr: SocketAddr = cfg
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cfg.server.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "shelfscout.listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(wait_for_shutdown(shutdown.clone()))
    .await
    .context("server shutdown")?;

    shutdown.cancel();
    if let Err(e) = eviction.await {
        warn!(error = %e, "governor eviction task ended abnormally");
    }
    info!("shelfscout.stopped");
    Ok(())
}

async fn wait_for_shutdown(token: CancellationToken) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "ctrl-c handler failed; shutting down");
            }
            info!("shelfscout.shutdown_requested");
        }
        _ = token.cancelled() => {}
    }
    token.cancel();
}
