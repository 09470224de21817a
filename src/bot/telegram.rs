use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use crate::config::{Config, POLL_TIMEOUT_SECS};
use crate::error::{AppError, Result};
use crate::types::{ApiResponse, BotCommand, Update};

/// Outbound side of the chat platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;
    async fn send_photo(&self, chat_id: i64, png: Vec<u8>, caption: &str) -> Result<()>;
}

/// Minimal Telegram Bot API client.
pub struct TelegramClient {
    client: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        // Must outlive a getUpdates long poll.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 30))
            .build()?;
        Ok(Self {
            client,
            base: format!(
                "{}/bot{}",
                cfg.telegram_api_url.trim_end_matches('/'),
                cfg.tg_token
            ),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let resp = self.client.post(self.url(method)).json(&body).send().await?;
        unwrap_response(method, resp.json::<ApiResponse<T>>().await?)
    }

    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<()> {
        let mut body = json!({ "url": url, "allowed_updates": ["message"] });
        if let Some(secret) = secret {
            body["secret_token"] = json!(secret);
        }
        let _: bool = self.call("setWebhook", body).await?;
        info!("[TELEGRAM] webhook registered at {url}");
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self.call("deleteWebhook", json!({})).await?;
        Ok(())
    }

    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()> {
        let _: bool = self.call("setMyCommands", json!({ "commands": commands })).await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        debug!(chat_id, len = text.len(), "[TELEGRAM] sendMessage");
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": text,
                    "disable_web_page_preview": true,
                }),
            )
            .await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, png: Vec<u8>, caption: &str) -> Result<()> {
        debug!(chat_id, bytes = png.len(), "[TELEGRAM] sendPhoto");
        let photo = reqwest::multipart::Part::bytes(png)
            .file_name("analyzed.png")
            .mime_str("image/png")?;
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("photo", photo);

        let resp = self
            .client
            .post(self.url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;
        let _: serde_json::Value =
            unwrap_response("sendPhoto", resp.json::<ApiResponse<serde_json::Value>>().await?)?;
        Ok(())
    }
}

fn unwrap_response<T>(method: &str, resp: ApiResponse<T>) -> Result<T> {
    match (resp.ok, resp.result) {
        (true, Some(result)) => Ok(result),
        (true, None) => Err(AppError::Telegram(format!("{method}: ok response without result"))),
        (false, _) => Err(AppError::Telegram(format!(
            "{method}: {}",
            resp.description.unwrap_or_else(|| "unknown error".to_string())
        ))),
    }
}
