//! Shared health state for the /health endpoint.
//! Updated by the dispatcher and the draw service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Process-wide counters. Holds no draw data.
#[derive(Default)]
pub struct HealthState {
    /// Updates received from Telegram (webhook or polling).
    pub updates_received: AtomicU64,
    /// Commands that ran to completion (including error replies).
    pub commands_handled: AtomicU64,
    /// Draw feed fetches that failed.
    pub feed_failures: AtomicU64,
    /// Unix seconds of the last successful feed fetch (0 = none).
    pub last_feed_ok_at: AtomicU64,
}

#[derive(Debug, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub updates_received: u64,
    pub commands_handled: u64,
    pub feed_failures: u64,
    pub last_feed_ok_at: Option<u64>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_updates_received(&self) {
        self.updates_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_commands_handled(&self) {
        self.commands_handled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_feed_failures(&self) {
        self.feed_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_feed_success(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.last_feed_ok_at.store(now, Ordering::Relaxed);
    }

    pub fn feed_failures(&self) -> u64 {
        self.feed_failures.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let last_ok = self.last_feed_ok_at.load(Ordering::Relaxed);
        HealthSnapshot {
            status: "ok",
            updates_received: self.updates_received.load(Ordering::Relaxed),
            commands_handled: self.commands_handled.load(Ordering::Relaxed),
            feed_failures: self.feed_failures(),
            last_feed_ok_at: (last_ok > 0).then_some(last_ok),
        }
    }
}
