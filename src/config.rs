use crate::error::{AppError, Result};

pub const DRAWS_URL: &str = "https://www.canada.ca/content/dam/ircc/documents/json/ee_rounds_123_en.json";
pub const CHART_API_URL: &str = "https://quickchart.io";
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Number of consecutive draws averaged per rolling-average point.
pub const DEFAULT_ROLLING_WINDOW: usize = 4;

/// Sub-class matching only runs when primary matches are fewer than this.
pub const SUBCLASS_FALLBACK_THRESHOLD: usize = 10;

/// Default draw counts per command.
pub const DEFAULT_DRAWS_COUNT: usize = 5;
pub const DEFAULT_FILTER_COUNT: usize = 50;
pub const DEFAULT_TREND_COUNT: usize = 20;

/// Upper bound on any requested draw count.
pub const MAX_DRAW_COUNT: usize = 100;

/// Telegram rejects messages over 4096 chars; replies are chunked below that.
pub const MESSAGE_CHUNK_CHARS: usize = 4000;

/// Rendered chart size in pixels.
pub const CHART_WIDTH: u32 = 600;
pub const CHART_HEIGHT: u32 = 400;

/// Long-poll timeout passed to getUpdates (seconds).
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Poll retry backoff values in milliseconds.
pub const POLL_BACKOFF_MS: &[u64] = &[1_000, 2_000, 5_000, 10_000];

#[derive(Debug, Clone)]
pub struct Config {
    pub tg_token: String,
    /// Public base URL (APP_URL). None = long-polling mode.
    pub app_url: Option<String>,
    pub webhook_path: String,
    /// Expected X-Telegram-Bot-Api-Secret-Token header (WEBHOOK_SECRET)
    pub webhook_secret: Option<String>,
    pub port: u16,
    pub log_level: String,
    pub draws_url: String,
    pub chart_api_url: String,
    pub telegram_api_url: String,
    pub feed_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let tg_token = std::env::var("TG_TOKEN").unwrap_or_default();
        if tg_token.trim().is_empty() {
            return Err(AppError::Config("TG_TOKEN must be set".to_string()));
        }

        Ok(Self {
            tg_token,
            app_url: non_empty_var("APP_URL").map(|u| u.trim_end_matches('/').to_string()),
            webhook_path: normalize_webhook_path(
                &std::env::var("WEBHOOK_PATH").unwrap_or_else(|_| "/webhook".to_string()),
            ),
            webhook_secret: non_empty_var("WEBHOOK_SECRET"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("PORT must be a valid port number".to_string()))?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            draws_url: std::env::var("DRAWS_URL").unwrap_or_else(|_| DRAWS_URL.to_string()),
            chart_api_url: std::env::var("CHART_API_URL")
                .unwrap_or_else(|_| CHART_API_URL.to_string()),
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| TELEGRAM_API_URL.to_string()),
            feed_timeout_secs: parse_timeout_secs(
                &std::env::var("FEED_TIMEOUT_SECS").unwrap_or_else(|_| "20".to_string()),
            )?,
        })
    }

    /// Full webhook URL, when running in webhook mode.
    pub fn webhook_url(&self) -> Option<String> {
        self.app_url
            .as_ref()
            .map(|base| format!("{base}{}", self.webhook_path))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Whole seconds, at least 1.
fn parse_timeout_secs(raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or_else(|| {
            AppError::Config(format!("FEED_TIMEOUT_SECS must be a positive number of seconds, got {raw:?}"))
        })
}

fn normalize_webhook_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "/webhook".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
