use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::bot::dispatcher::Dispatcher;
use crate::bot::telegram::TelegramClient;
use crate::config::POLL_BACKOFF_MS;
use crate::types::Update;

/// getUpdates loop for deployments without a public webhook URL.
pub struct UpdatePoller {
    telegram: Arc<TelegramClient>,
    dispatcher: Arc<Dispatcher>,
    offset: i64,
}

impl UpdatePoller {
    pub fn new(telegram: Arc<TelegramClient>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { telegram, dispatcher, offset: 0 }
    }

    pub async fn run(mut self) {
        if let Err(e) = self.telegram.delete_webhook().await {
            warn!("[POLL] deleteWebhook failed, polling anyway: {e}");
        }
        info!("[POLL] long-polling for updates");

        let mut backoff_idx = 0usize;
        loop {
            match self.telegram.get_updates(self.offset).await {
                Ok(updates) => {
                    backoff_idx = 0;
                    self.dispatch_batch(updates);
                }
                Err(e) => {
                    let delay_ms = backoff_delay_ms(backoff_idx);
                    backoff_idx = (backoff_idx + 1).min(POLL_BACKOFF_MS.len() - 1);
                    error!("[POLL] getUpdates failed, retrying in {delay_ms}ms: {e}");
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    /// Each update runs on its own task; chats never wait on each other.
    fn dispatch_batch(&mut self, updates: Vec<Update>) {
        self.offset = next_offset(self.offset, &updates);
        for update in updates {
            let dispatcher = Arc::clone(&self.dispatcher);
            tokio::spawn(async move { dispatcher.handle_update(update).await });
        }
    }
}

/// One past the highest update id seen, never moving backwards.
fn next_offset(current: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map_or(current, |next| next.max(current))
}

fn backoff_delay_ms(idx: usize) -> u64 {
    POLL_BACKOFF_MS
        .get(idx)
        .or_else(|| POLL_BACKOFF_MS.last())
        .copied()
        .unwrap_or(1_000)
}
