use std::collections::BTreeMap;

use crate::config::SUBCLASS_FALLBACK_THRESHOLD;
use crate::error::{AppError, Result};
use crate::types::{FilterResult, NormalizedDraw};

/// Short filter codes and the program label they match inside draw categories.
pub const PROGRAMS: &[(&str, &str)] = &[
    ("CEC", "Canadian Experience Class"),
    ("PNP", "Provincial Nominee Program"),
    ("FSW", "Federal Skilled Worker"),
    ("FST", "Federal Skilled Trades"),
    ("TRADE", "Trade occupations"),
    ("HEALTH", "Healthcare"),
    ("STEM", "STEM occupations"),
    ("TRANSPORT", "Transport occupations"),
    ("AGRI", "Agriculture and agri-food occupations"),
    ("EDU", "Education occupations"),
    ("FRENCH", "French language proficiency"),
    ("GENERAL", "General"),
];

/// Resolves filter codes and partitions draws into primary and sub-class matches.
#[derive(Debug, Clone)]
pub struct ProgramClassifier {
    programs: BTreeMap<String, &'static str>,
}

impl Default for ProgramClassifier {
    fn default() -> Self {
        Self::new(PROGRAMS)
    }
}

impl ProgramClassifier {
    pub fn new(table: &[(&str, &'static str)]) -> Self {
        Self {
            programs: table
                .iter()
                .map(|(code, name)| (code.to_ascii_uppercase(), *name))
                .collect(),
        }
    }

    /// Case-insensitive code lookup.
    pub fn resolve(&self, code: &str) -> Result<&'static str> {
        self.programs
            .get(&code.trim().to_ascii_uppercase())
            .copied()
            .ok_or_else(|| AppError::UnknownFilterCode(code.trim().to_string()))
    }

    /// Known codes in sorted order, for help and error replies.
    pub fn codes(&self) -> Vec<&str> {
        self.programs.keys().map(String::as_str).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.programs.iter().map(|(code, name)| (code.as_str(), *name))
    }

    /// Primary matches: `class` contains the program name (case-sensitive).
    /// Sub-class matches are only searched when primary matches are sparse,
    /// otherwise they come back empty.
    pub fn classify(&self, code: &str, draws: &[NormalizedDraw]) -> Result<FilterResult> {
        let program = self.resolve(code)?;

        let primary_matches: Vec<NormalizedDraw> = draws
            .iter()
            .filter(|d| d.class.contains(program))
            .cloned()
            .collect();

        let subclass_matches = if primary_matches.len() < SUBCLASS_FALLBACK_THRESHOLD {
            draws
                .iter()
                .filter(|d| d.subclass.contains(program))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        Ok(FilterResult {
            program: program.to_string(),
            primary_matches,
            subclass_matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CrsScore;
    use chrono::NaiveDate;

    fn draw(n: u32, class: &str, subclass: &str) -> NormalizedDraw {
        NormalizedDraw {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(n)),
            draw_number: n.to_string(),
            crs: CrsScore::new("500"),
            class: class.to_string(),
            subclass: subclass.to_string(),
            draw_size: "1000".to_string(),
        }
    }

    fn numbers(draws: &[NormalizedDraw]) -> Vec<&str> {
        draws.iter().map(|d| d.draw_number.as_str()).collect()
    }

    #[test]
    fn code_lookup_is_case_insensitive() {
        let c = ProgramClassifier::default();
        assert_eq!(c.resolve("cec").unwrap(), "Canadian Experience Class");
        assert_eq!(c.resolve("CEC").unwrap(), c.resolve("cec").unwrap());
        assert_eq!(c.resolve(" Pnp ").unwrap(), "Provincial Nominee Program");
    }

    #[test]
    fn unknown_code_is_an_error() {
        let c = ProgramClassifier::default();
        let err = c.classify("XYZ", &[draw(1, "General", "")]).unwrap_err();
        assert!(matches!(err, AppError::UnknownFilterCode(code) if code == "XYZ"));
    }

    #[test]
    fn primary_and_subclass_preserve_input_order() {
        let c = ProgramClassifier::default();
        let draws = vec![
            draw(5, "Provincial Nominee Program", ""),
            draw(4, "Canadian Experience Class", ""),
            draw(3, "Provincial Nominee Program", ""),
            draw(2, "General", "Provincial Nominee Program"),
        ];
        let result = c.classify("pnp", &draws).unwrap();
        assert_eq!(result.program, "Provincial Nominee Program");
        assert_eq!(numbers(&result.primary_matches), ["5", "3"]);
        assert_eq!(numbers(&result.subclass_matches), ["2"]);
    }

    #[test]
    fn substring_match_is_case_sensitive() {
        let c = ProgramClassifier::default();
        let draws = vec![
            draw(2, "STEM occupations (2023-1)", ""),
            draw(1, "stem occupations", ""),
        ];
        let result = c.classify("STEM", &draws).unwrap();
        assert_eq!(numbers(&result.primary_matches), ["2"]);
    }

    #[test]
    fn subclass_search_skipped_when_primary_is_dense() {
        let c = ProgramClassifier::default();
        let mut draws: Vec<NormalizedDraw> = (0..10)
            .map(|n| draw(n, "Canadian Experience Class", ""))
            .collect();
        draws.push(draw(20, "General", "Canadian Experience Class"));

        let result = c.classify("CEC", &draws).unwrap();
        assert_eq!(result.primary_matches.len(), 10);
        assert!(result.subclass_matches.is_empty());
    }

    #[test]
    fn subclass_search_runs_just_below_threshold() {
        let c = ProgramClassifier::default();
        let mut draws: Vec<NormalizedDraw> = (0..9)
            .map(|n| draw(n, "Canadian Experience Class", ""))
            .collect();
        draws.push(draw(20, "General", "Canadian Experience Class"));

        let result = c.classify("CEC", &draws).unwrap();
        assert_eq!(result.primary_matches.len(), 9);
        assert_eq!(numbers(&result.subclass_matches), ["20"]);
    }

    #[test]
    fn matches_are_subsets_of_input() {
        let c = ProgramClassifier::default();
        let draws = vec![
            draw(3, "Trade occupations (Version 1)", ""),
            draw(2, "General", "Trade occupations"),
            draw(1, "French language proficiency", ""),
        ];
        for (code, _) in PROGRAMS {
            let result = c.classify(code, &draws).unwrap();
            let program = result.program.as_str();
            assert!(result.primary_matches.iter().all(|d| draws.contains(d) && d.class.contains(program)));
            assert!(result.subclass_matches.iter().all(|d| draws.contains(d) && d.subclass.contains(program)));
        }
    }
}
