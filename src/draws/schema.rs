//! Raw-to-canonical field mapping for the rounds feed.
//!
//! The feed has renamed its category fields between revisions: older
//! documents carried the program in `drawText2`, newer ones carry it in
//! `drawName` and reuse `drawText2` for the sub-category. Every field the
//! normalizer reads goes through `FEED_FIELDS`, so a future rename is an
//! edit to that table only.

use serde_json::{Map, Value};

/// Candidate upstream keys per canonical field, tried in order.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub date: &'static [&'static str],
    pub draw_number: &'static [&'static str],
    pub crs: &'static [&'static str],
    pub class: &'static [&'static str],
    pub subclass: &'static [&'static str],
    pub draw_size: &'static [&'static str],
}

pub const FEED_FIELDS: FieldMap = FieldMap {
    date: &["drawDate", "drawDateFull"],
    draw_number: &["drawNumber"],
    crs: &["drawCRS"],
    class: &["drawName", "drawText2"],
    subclass: &["drawText2"],
    draw_size: &["drawSize"],
};

/// Field values pulled out of one raw record, still as upstream text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFields {
    pub date: Option<String>,
    pub draw_number: String,
    pub crs: String,
    pub class: String,
    pub subclass: String,
    pub draw_size: String,
}

impl FieldMap {
    pub fn read(&self, record: &Map<String, Value>) -> RawFields {
        let class = lookup(record, self.class);
        let class_key = class.as_ref().map(|(key, _)| *key);

        // A key already consumed as the class (older revision) is not a sub-category.
        let subclass_keys: Vec<&'static str> = self
            .subclass
            .iter()
            .copied()
            .filter(|k| Some(*k) != class_key)
            .collect();

        RawFields {
            date: lookup(record, self.date).map(|(_, v)| v),
            draw_number: text_or_empty(record, self.draw_number),
            crs: text_or_empty(record, self.crs),
            class: class.map(|(_, v)| v).unwrap_or_default(),
            subclass: lookup(record, &subclass_keys)
                .map(|(_, v)| v)
                .unwrap_or_default(),
            draw_size: text_or_empty(record, self.draw_size),
        }
    }
}

fn text_or_empty(record: &Map<String, Value>, keys: &[&'static str]) -> String {
    lookup(record, keys).map(|(_, v)| v).unwrap_or_default()
}

/// First key holding a scalar, with that scalar rendered as text.
fn lookup(record: &Map<String, Value>, keys: &[&'static str]) -> Option<(&'static str, String)> {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(scalar_text).map(|v| (*key, v)))
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
