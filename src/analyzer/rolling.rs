use chrono::NaiveDate;
use serde::Serialize;

use crate::config::DEFAULT_ROLLING_WINDOW;
use crate::types::{NormalizedDraw, RollingAveragePoint};

/// Rolling-average output plus what the caller needs to explain an empty result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingSeries {
    pub window: usize,
    /// Draws with a numeric CRS that went into the windows.
    pub samples: usize,
    pub points: Vec<RollingAveragePoint>,
}

/// Why a series came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insufficiency {
    /// No draw had a numeric CRS.
    NoData,
    /// Some numeric scores, but fewer than one full window.
    NotEnough { have: usize, need: usize },
}

impl RollingSeries {
    pub fn insufficiency(&self) -> Option<Insufficiency> {
        if !self.points.is_empty() {
            None
        } else if self.samples == 0 {
            Some(Insufficiency::NoData)
        } else {
            Some(Insufficiency::NotEnough { have: self.samples, need: self.window })
        }
    }
}

/// Stable ascending sort by draw date.
pub fn sort_chronological(draws: &mut [NormalizedDraw]) {
    draws.sort_by_key(|d| d.date);
}

/// Mean CRS over every run of `window` consecutive draws, oldest first.
///
/// Draws are sorted ascending by date here, so feed order (most-recent-first)
/// is safe to pass in. Non-numeric scores are dropped before windowing. Each
/// point carries the date of the first draw in its window. A window of 0 is
/// treated as 1; `None` means the default window of 4.
pub fn analyze_rolling_average(draws: &[NormalizedDraw], window: Option<usize>) -> RollingSeries {
    let window = window.unwrap_or(DEFAULT_ROLLING_WINDOW).max(1);

    let mut samples: Vec<(NaiveDate, f64)> = draws
        .iter()
        .filter_map(|d| d.crs.as_number().map(|crs| (d.date, crs)))
        .collect();
    samples.sort_by_key(|(date, _)| *date);

    let points = if samples.len() < window {
        Vec::new()
    } else {
        samples
            .windows(window)
            .map(|batch| {
                let sum: f64 = batch.iter().map(|(_, crs)| crs).sum();
                RollingAveragePoint {
                    date: batch[0].0,
                    average: round2(sum / window as f64),
                }
            })
            .collect()
    };

    RollingSeries { window, samples: samples.len(), points }
}

/// Round half away from zero to 2 decimal places.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
