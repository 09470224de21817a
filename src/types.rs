use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Draws
// ---------------------------------------------------------------------------

/// One entry of the upstream `rounds` array, untouched. Field names drift
/// between feed revisions, so nothing is assumed until `draws::schema` reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDrawRecord(pub serde_json::Value);

/// CRS score exactly as the feed reported it. Display paths use the raw text;
/// only the analyzer coerces it to a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrsScore(String);

impl CrsScore {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Finite numeric value, or None for text like "N/A" or an empty field.
    pub fn as_number(&self) -> Option<f64> {
        let s = self.0.trim();
        if s.is_empty() {
            return None;
        }
        s.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl std::fmt::Display for CrsScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedDraw {
    pub date: NaiveDate,
    /// Opaque upstream identifier.
    pub draw_number: String,
    pub crs: CrsScore,
    /// Primary program label.
    pub class: String,
    /// Secondary program label, empty when the feed has none.
    pub subclass: String,
    /// Invitation count as the feed wrote it (e.g. "1,500").
    pub draw_size: String,
}

/// Draws matching a program, both taken from the same fetched window and
/// both most-recent-first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterResult {
    pub program: String,
    #[serde(rename = "primary")]
    pub primary_matches: Vec<NormalizedDraw>,
    #[serde(rename = "subclass")]
    pub subclass_matches: Vec<NormalizedDraw>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingAveragePoint {
    /// Date of the first draw in the window.
    pub date: NaiveDate,
    /// Mean CRS over the window, rounded to 2 decimals.
    pub average: f64,
}

// ---------------------------------------------------------------------------
// Telegram Bot API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// Username when set, otherwise "first last".
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return username.to_string();
        }
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        parts.join(" ")
    }
}

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: &'static str,
    pub description: &'static str,
}
