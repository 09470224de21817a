mod analyzer;
mod api;
mod bot;
mod chart;
mod config;
mod draws;
mod error;
mod fetcher;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::bot::commands::COMMAND_MENU;
use crate::bot::{Dispatcher, TelegramClient, UpdatePoller};
use crate::chart::QuickChartRenderer;
use crate::config::Config;
use crate::draws::{DrawService, ProgramClassifier};
use crate::error::Result;
use crate::fetcher::DrawFeedClient;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());

    // --- Draw pipeline ---
    let feed = Arc::new(DrawFeedClient::new(&cfg)?);
    let classifier = Arc::new(ProgramClassifier::default());
    info!(
        "[FEED] source {} ({} program codes)",
        cfg.draws_url,
        classifier.codes().len()
    );
    let draws = DrawService::new(feed, classifier, Arc::clone(&latency), Arc::clone(&health));

    // --- Telegram ---
    let renderer = Arc::new(QuickChartRenderer::new(&cfg)?);
    let telegram = Arc::new(TelegramClient::new(&cfg)?);
    let dispatcher = Arc::new(Dispatcher::new(
        draws.clone(),
        renderer,
        telegram.clone(),
        Arc::clone(&health),
    ));

    if let Err(e) = telegram.set_my_commands(COMMAND_MENU).await {
        warn!("[TELEGRAM] setMyCommands failed: {e}");
    }

    match cfg.webhook_url() {
        Some(url) => {
            telegram
                .set_webhook(&url, cfg.webhook_secret.as_deref())
                .await?;
        }
        None => {
            let poller = UpdatePoller::new(Arc::clone(&telegram), Arc::clone(&dispatcher));
            tokio::spawn(async move { poller.run().await });
        }
    }

    // --- HTTP server: webhook + JSON API ---
    let state = ApiState {
        draws,
        dispatcher,
        health,
        latency,
        webhook_secret: cfg.webhook_secret.clone(),
    };
    let app = router(state, &cfg.webhook_path);
    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP server listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
