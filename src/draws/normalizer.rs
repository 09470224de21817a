use chrono::{DateTime, NaiveDate};
use tracing::{debug, warn};

use crate::draws::schema::FEED_FIELDS;
use crate::types::{CrsScore, NormalizedDraw, RawDrawRecord};

/// Convert raw feed records into `NormalizedDraw`s, preserving input order.
/// Records that are not objects or whose date does not parse are skipped.
pub fn normalize(records: Vec<RawDrawRecord>) -> Vec<NormalizedDraw> {
    let total = records.len();
    let draws: Vec<NormalizedDraw> = records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, record)| normalize_one(idx, record))
        .collect();

    if draws.len() < total {
        debug!(
            kept = draws.len(),
            dropped = total - draws.len(),
            "[NORMALIZE] dropped {} of {total} records",
            total - draws.len(),
        );
    }
    draws
}

fn normalize_one(idx: usize, record: RawDrawRecord) -> Option<NormalizedDraw> {
    let serde_json::Value::Object(fields) = record.0 else {
        warn!(index = idx, "[NORMALIZE] skipping non-object record");
        return None;
    };

    let raw = FEED_FIELDS.read(&fields);

    let Some(date) = raw.date.as_deref().and_then(parse_draw_date) else {
        warn!(
            index = idx,
            draw_number = %raw.draw_number,
            raw_date = ?raw.date,
            "[NORMALIZE] skipping record with unparseable date",
        );
        return None;
    };

    Some(NormalizedDraw {
        date,
        draw_number: raw.draw_number,
        crs: CrsScore::new(raw.crs),
        class: raw.class,
        subclass: raw.subclass,
        draw_size: raw.draw_size,
    })
}

/// Accepts `2024-09-19`, an RFC 3339 timestamp, a `2024-09-19 ...` prefix,
/// or the long form `September 19, 2024`.
pub fn parse_draw_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Some(prefix) = s.get(..10) {
        if let Ok(d) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(d);
        }
    }
    NaiveDate::parse_from_str(s, "%B %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%b %d, %Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawDrawRecord {
        RawDrawRecord(v)
    }

    fn record(date: &str, number: &str, crs: &str) -> RawDrawRecord {
        raw(json!({
            "drawDate": date,
            "drawNumber": number,
            "drawCRS": crs,
            "drawName": "Provincial Nominee Program",
            "drawSize": "1,000",
        }))
    }

    #[test]
    fn preserves_order_of_valid_records() {
        let draws = normalize(vec![
            record("2024-09-19", "311", "509"),
            record("2024-09-13", "310", "710"),
            record("2024-08-27", "309", "507"),
        ]);
        let numbers: Vec<&str> = draws.iter().map(|d| d.draw_number.as_str()).collect();
        assert_eq!(numbers, ["311", "310", "309"]);
    }

    #[test]
    fn drops_unparseable_dates_without_aborting() {
        let draws = normalize(vec![
            record("2024-09-19", "311", "509"),
            record("not-a-date", "310", "710"),
            raw(json!({"drawNumber": "308"})),
            raw(json!("garbage")),
            record("2024-08-27", "309", "507"),
        ]);
        let numbers: Vec<&str> = draws.iter().map(|d| d.draw_number.as_str()).collect();
        assert_eq!(numbers, ["311", "309"]);
    }

    #[test]
    fn all_invalid_yields_empty() {
        let draws = normalize(vec![record("soon", "1", "400"), record("", "2", "410")]);
        assert!(draws.is_empty());
    }

    #[test]
    fn keeps_non_numeric_crs_verbatim() {
        let draws = normalize(vec![record("2024-09-19", "311", "N/A")]);
        assert_eq!(draws[0].crs.to_string(), "N/A");
        assert_eq!(draws[0].crs.as_number(), None);
    }

    #[test]
    fn missing_subclass_defaults_to_empty() {
        let draws = normalize(vec![record("2024-09-19", "311", "509")]);
        assert_eq!(draws[0].class, "Provincial Nominee Program");
        assert_eq!(draws[0].subclass, "");
    }

    #[test]
    fn parses_supported_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 9, 19);
        assert_eq!(parse_draw_date("2024-09-19"), expected);
        assert_eq!(parse_draw_date("2024-09-19T14:22:01Z"), expected);
        assert_eq!(parse_draw_date("2024-09-19 14:22:01 UTC"), expected);
        assert_eq!(parse_draw_date("September 19, 2024"), expected);
        assert_eq!(parse_draw_date("Sep 19, 2024"), expected);
        assert_eq!(parse_draw_date("2024-13-40"), None);
        assert_eq!(parse_draw_date("not-a-date"), None);
    }
}
