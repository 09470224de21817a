use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::{Config, CHART_HEIGHT, CHART_WIDTH};
use crate::error::{AppError, Result};
use crate::types::{NormalizedDraw, RollingAveragePoint};

/// Turns a chronological draw series into a PNG.
/// Both inputs must already be ascending by date.
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(
        &self,
        draws: &[NormalizedDraw],
        averages: &[RollingAveragePoint],
        title: &str,
    ) -> Result<Vec<u8>>;
}

/// Renders Chart.js configs through the QuickChart HTTP API.
pub struct QuickChartRenderer {
    client: reqwest::Client,
    endpoint: String,
}

impl QuickChartRenderer {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chart", cfg.chart_api_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ChartRenderer for QuickChartRenderer {
    async fn render(
        &self,
        draws: &[NormalizedDraw],
        averages: &[RollingAveragePoint],
        title: &str,
    ) -> Result<Vec<u8>> {
        let body = json!({
            "width": CHART_WIDTH,
            "height": CHART_HEIGHT,
            "format": "png",
            "backgroundColor": "white",
            "chart": chart_config(draws, averages, title),
        });

        debug!(points = averages.len(), draws = draws.len(), "[CHART] requesting render");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::RenderFailure(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            warn!(%status, "[CHART] render rejected: {detail}");
            return Err(AppError::RenderFailure(format!("chart service returned {status}")));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| AppError::RenderFailure(e.to_string()))?;
        if bytes.is_empty() {
            return Err(AppError::RenderFailure("chart service returned an empty image".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

/// Line chart: per-draw CRS plus the rolling average.
/// Point `i` belongs to the i-th draw with a numeric CRS, so same-day draws
/// keep their own averages. Gaps are null.
pub fn chart_config(draws: &[NormalizedDraw], averages: &[RollingAveragePoint], title: &str) -> Value {
    let labels: Vec<String> = draws.iter().map(|d| d.date.to_string()).collect();

    let crs: Vec<Option<f64>> = draws.iter().map(|d| d.crs.as_number()).collect();

    let mut points = averages.iter();
    let rolling: Vec<Option<f64>> = crs
        .iter()
        .map(|score| score.and_then(|_| points.next().map(|p| p.average)))
        .collect();

    json!({
        "type": "line",
        "data": {
            "labels": labels,
            "datasets": [
                {
                    "label": "CRS",
                    "data": crs,
                    "borderColor": "rgb(201, 203, 207)",
                    "pointRadius": 2,
                    "spanGaps": true,
                    "fill": false,
                },
                {
                    "label": "Rolling Average CRS",
                    "data": rolling,
                    "borderColor": "rgb(75, 192, 192)",
                    "tension": 0.1,
                    "spanGaps": true,
                    "fill": false,
                },
            ],
        },
        "options": {
            "plugins": { "title": { "display": true, "text": title } },
            "scales": { "y": { "beginAtZero": false } },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{analyze_rolling_average, sort_chronological};
    use crate::types::CrsScore;
    use chrono::NaiveDate;

    fn draw(day: u32, crs: &str) -> NormalizedDraw {
        NormalizedDraw {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            draw_number: day.to_string(),
            crs: CrsScore::new(crs),
            class: "General".to_string(),
            subclass: String::new(),
            draw_size: "500".to_string(),
        }
    }

    #[test]
    fn datasets_align_with_labels() {
        let draws = vec![draw(1, "500"), draw(2, "N/A"), draw(3, "520")];
        let averages = vec![RollingAveragePoint {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            average: 510.0,
        }];

        let cfg = chart_config(&draws, &averages, "CRS trend");
        assert_eq!(cfg["data"]["labels"], json!(["2024-05-01", "2024-05-02", "2024-05-03"]));
        assert_eq!(cfg["data"]["datasets"][0]["data"], json!([500.0, null, 520.0]));
        assert_eq!(cfg["data"]["datasets"][1]["data"], json!([510.0, null, null]));
        assert_eq!(cfg["options"]["plugins"]["title"]["text"], "CRS trend");
    }

    #[test]
    fn same_day_draws_keep_their_own_averages() {
        let mut draws = vec![draw(1, "500"), draw(1, "600"), draw(2, "700"), draw(3, "800")];
        draws[1].draw_number = "1b".to_string();
        let series = analyze_rolling_average(&draws, Some(2));
        sort_chronological(&mut draws);

        let cfg = chart_config(&draws, &series.points, "CRS trend");
        assert_eq!(cfg["data"]["datasets"][1]["data"], json!([550.0, 650.0, 750.0, null]));
    }
}
