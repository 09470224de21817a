use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Draw feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("No valid draws in feed response")]
    NoValidDraws,

    #[error("Unknown filter code: {0}")]
    UnknownFilterCode(String),

    #[error("Chart render failed: {0}")]
    RenderFailure(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::UnknownFilterCode(_) => StatusCode::BAD_REQUEST,
            AppError::NoValidDraws => StatusCode::NOT_FOUND,
            AppError::FeedUnavailable(_) | AppError::RenderFailure(_) | AppError::Telegram(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
