use chrono::NaiveDate;

use crate::analyzer::Insufficiency;
use crate::config::MESSAGE_CHUNK_CHARS;
use crate::draws::ProgramClassifier;
use crate::types::NormalizedDraw;

pub const FEED_UNAVAILABLE: &str =
    "Unable to fetch draw data right now. Please try again later.";
pub const NO_DRAWS: &str = "No draw data found.";
pub const CHART_FAILED: &str = "Could not generate the chart. Please try again.";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Send /help to see what I can do.";

/// "September 19, 2024"
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

pub fn format_draw(d: &NormalizedDraw) -> String {
    let mut out = format!(
        "Draw #{} – {}\nProgram: {}",
        d.draw_number,
        format_date(d.date),
        d.class,
    );
    if !d.subclass.is_empty() && d.subclass != d.class {
        out.push_str(&format!("\nSub-category: {}", d.subclass));
    }
    out.push_str(&format!("\nCRS: {} | Invitations: {}", d.crs, d.draw_size));
    out
}

/// Header line followed by one block per draw, blank-line separated.
pub fn format_draw_list(header: &str, draws: &[NormalizedDraw]) -> String {
    let mut blocks = vec![header.to_string()];
    blocks.extend(draws.iter().map(format_draw));
    blocks.join("\n\n")
}

pub fn insufficient_data(reason: Insufficiency) -> String {
    match reason {
        Insufficiency::NoData => "No valid CRS scores found in these draws, nothing to chart.".to_string(),
        Insufficiency::NotEnough { have, need } => format!(
            "Not enough data points for a {need}-draw rolling average (found {have}). Try a larger count, e.g. /crs_trend 20."
        ),
    }
}

pub fn unknown_program(code: &str, classifier: &ProgramClassifier) -> String {
    format!(
        "Unknown program code '{code}'. Available codes: {}",
        classifier.codes().join(", ")
    )
}

pub fn welcome(classifier: &ProgramClassifier) -> String {
    format!(
        "Welcome to the IRCC Draws Bot! 🇨🇦\n\nTrack Express Entry invitation rounds and CRS cut-offs.\n\n{}",
        help(classifier)
    )
}

pub fn help(classifier: &ProgramClassifier) -> String {
    let programs: Vec<String> = classifier
        .entries()
        .map(|(code, name)| format!("  {code} – {name}"))
        .collect();
    format!(
        "Commands:\n\
         /help – list the bot commands\n\
         /draws [count] – latest draws (default 5)\n\
         /filter_draws <code> [count] – draws for one program\n\
         /crs_trend [count] – rolling average CRS chart\n\n\
         Program codes:\n{}",
        programs.join("\n")
    )
}

/// Split a reply into Telegram-sized messages, preferring blank-line
/// boundaries and hard-splitting only oversized blocks.
pub fn chunk_message(text: &str) -> Vec<String> {
    chunk_with_limit(text, MESSAGE_CHUNK_CHARS)
}

fn chunk_with_limit(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for block in text.split("\n\n") {
        for piece in hard_split(block, limit) {
            let extra = if current.is_empty() { 0 } else { 2 };
            if !current.is_empty() && current.chars().count() + extra + piece.chars().count() > limit {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&piece);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn hard_split(block: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = block.chars().collect();
    if chars.len() <= limit {
        return vec![block.to_string()];
    }
    chars.chunks(limit).map(|c| c.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CrsScore;

    fn draw(crs: &str, class: &str, subclass: &str) -> NormalizedDraw {
        NormalizedDraw {
            date: NaiveDate::from_ymd_opt(2024, 9, 19).unwrap(),
            draw_number: "311".to_string(),
            crs: CrsScore::new(crs),
            class: class.to_string(),
            subclass: subclass.to_string(),
            draw_size: "4,000".to_string(),
        }
    }

    #[test]
    fn formats_long_dates() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 9, 5).unwrap()), "September 5, 2024");
    }

    #[test]
    fn draw_shows_raw_crs_and_distinct_subclass() {
        let text = format_draw(&draw("N/A", "General", "Trade occupations"));
        assert_eq!(
            text,
            "Draw #311 – September 19, 2024\nProgram: General\nSub-category: Trade occupations\nCRS: N/A | Invitations: 4,000"
        );

        let text = format_draw(&draw("509", "General", "General"));
        assert!(!text.contains("Sub-category"));
    }

    #[test]
    fn insufficient_messages_differ() {
        let none = insufficient_data(Insufficiency::NoData);
        let few = insufficient_data(Insufficiency::NotEnough { have: 2, need: 4 });
        assert_ne!(none, few);
        assert!(few.contains("found 2"));
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_message("a\n\nb"), vec!["a\n\nb".to_string()]);
    }

    #[test]
    fn chunks_split_on_block_boundaries() {
        let text = ["aaaa", "bbbb", "cccc"].join("\n\n");
        let chunks = chunk_with_limit(&text, 10);
        assert_eq!(chunks, vec!["aaaa\n\nbbbb".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn oversized_block_is_hard_split() {
        let chunks = chunk_with_limit("abcdefghij", 4);
        assert_eq!(chunks, ["abcd", "efgh", "ij"]);
    }
}
