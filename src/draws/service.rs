use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::draws::classifier::ProgramClassifier;
use crate::draws::normalizer::normalize;
use crate::error::{AppError, Result};
use crate::fetcher::DrawSource;
use crate::types::{FilterResult, NormalizedDraw};

/// Fetch → normalize → classify, one independent chain per call.
/// Holds no draw data between calls.
#[derive(Clone)]
pub struct DrawService {
    source: Arc<dyn DrawSource>,
    classifier: Arc<ProgramClassifier>,
    latency: Arc<LatencyStats>,
    health: Arc<HealthState>,
}

impl DrawService {
    pub fn new(
        source: Arc<dyn DrawSource>,
        classifier: Arc<ProgramClassifier>,
        latency: Arc<LatencyStats>,
        health: Arc<HealthState>,
    ) -> Self {
        Self { source, classifier, latency, health }
    }

    pub fn classifier(&self) -> &ProgramClassifier {
        &self.classifier
    }

    /// Most-recent-first draws from the last `max_count` feed records.
    /// May be empty when every record failed validation.
    pub async fn fetch_draws(&self, max_count: usize) -> Result<Vec<NormalizedDraw>> {
        let started = Instant::now();
        let fetched = self.source.fetch(max_count).await;
        self.latency.record(started.elapsed());

        let records = match fetched {
            Ok(r) => {
                self.health.record_feed_success();
                r
            }
            Err(e) => {
                self.health.inc_feed_failures();
                warn!("[FEED] fetch failed: {e}");
                return Err(e);
            }
        };

        let fetched_count = records.len();
        let draws = normalize(records);
        info!(
            fetched = fetched_count,
            valid = draws.len(),
            "[FEED] {} of {fetched_count} records normalized",
            draws.len(),
        );
        Ok(draws)
    }

    /// Like `fetch_draws`, but an empty result is `NoValidDraws`.
    pub async fn require_draws(&self, max_count: usize) -> Result<Vec<NormalizedDraw>> {
        let draws = self.fetch_draws(max_count).await?;
        if draws.is_empty() {
            return Err(AppError::NoValidDraws);
        }
        Ok(draws)
    }

    pub fn resolve_program(&self, code: &str) -> Result<&'static str> {
        self.classifier.resolve(code)
    }

    /// Resolves `code` before fetching, so an unknown code costs no request.
    /// Primary and sub-class matches come from the same fetched window.
    pub async fn filter_draws(&self, code: &str, max_count: usize) -> Result<FilterResult> {
        self.classifier.resolve(code)?;
        let draws = self.fetch_draws(max_count).await?;
        self.classifier.classify(code, &draws)
    }
}

#[cfg(test)]
pub mod testing {
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::types::RawDrawRecord;

    /// In-memory feed: serves a fixed `rounds` list, or fails every call.
    pub struct StaticSource {
        pub rounds: Option<Vec<serde_json::Value>>,
        pub calls: AtomicUsize,
    }

    impl StaticSource {
        pub fn new(rounds: Vec<serde_json::Value>) -> Self {
            Self { rounds: Some(rounds), calls: AtomicUsize::new(0) }
        }

        pub fn failing() -> Self {
            Self { rounds: None, calls: AtomicUsize::new(0) }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl DrawSource for StaticSource {
        async fn fetch(&self, max_count: usize) -> Result<Vec<RawDrawRecord>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            match &self.rounds {
                Some(rounds) => Ok(rounds
                    .iter()
                    .take(max_count)
                    .cloned()
                    .map(RawDrawRecord)
                    .collect()),
                None => Err(AppError::FeedUnavailable("connection refused".to_string())),
            }
        }
    }

    pub fn round(date: &str, number: u32, crs: &str, name: &str, text2: &str) -> serde_json::Value {
        serde_json::json!({
            "drawDate": date,
            "drawNumber": number.to_string(),
            "drawCRS": crs,
            "drawName": name,
            "drawText2": text2,
            "drawSize": "1,500",
        })
    }

    pub fn service(source: Arc<StaticSource>) -> DrawService {
        DrawService::new(
            source,
            Arc::new(ProgramClassifier::default()),
            Arc::new(LatencyStats::new()),
            Arc::new(HealthState::new()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn fetch_draws_drops_invalid_and_keeps_order() {
        let source = Arc::new(StaticSource::new(vec![
            round("2024-09-19", 311, "509", "Canadian Experience Class", ""),
            round("not-a-date", 310, "710", "Provincial Nominee Program", ""),
            round("2024-08-27", 309, "507", "General", ""),
        ]));
        let svc = service(source);

        let draws = svc.fetch_draws(10).await.unwrap();
        let numbers: Vec<&str> = draws.iter().map(|d| d.draw_number.as_str()).collect();
        assert_eq!(numbers, ["311", "309"]);
    }

    #[tokio::test]
    async fn require_draws_reports_no_valid_draws() {
        let source = Arc::new(StaticSource::new(vec![round("??", 1, "400", "General", "")]));
        let svc = service(source);
        assert!(matches!(svc.require_draws(5).await, Err(AppError::NoValidDraws)));
    }

    #[tokio::test]
    async fn feed_failure_propagates() {
        let svc = service(Arc::new(StaticSource::failing()));
        assert!(matches!(svc.fetch_draws(5).await, Err(AppError::FeedUnavailable(_))));
        assert_eq!(svc.health.feed_failures(), 1);
    }

    #[tokio::test]
    async fn unknown_code_does_not_fetch() {
        let source = Arc::new(StaticSource::new(vec![]));
        let svc = service(Arc::clone(&source));
        let err = svc.filter_draws("nope", 50).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownFilterCode(_)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn filter_uses_one_fetch_for_both_lists() {
        let source = Arc::new(StaticSource::new(vec![
            round("2024-09-19", 311, "509", "Canadian Experience Class", ""),
            round("2024-09-13", 310, "710", "Provincial Nominee Program", ""),
            round("2024-08-27", 309, "507", "General", "Canadian Experience Class"),
        ]));
        let svc = service(Arc::clone(&source));

        let result = svc.filter_draws("cec", 2).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(result.primary_matches.len(), 1);
        // Third round is outside the requested window.
        assert!(result.subclass_matches.is_empty());
    }
}
