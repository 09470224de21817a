use crate::config::{DEFAULT_DRAWS_COUNT, DEFAULT_FILTER_COUNT, DEFAULT_TREND_COUNT, MAX_DRAW_COUNT};
use crate::types::BotCommand;

/// Menu registered with setMyCommands.
pub const COMMAND_MENU: &[BotCommand] = &[
    BotCommand { command: "help", description: "List the bot commands" },
    BotCommand { command: "draws", description: "Latest Express Entry draws (e.g. /draws 5)" },
    BotCommand { command: "filter_draws", description: "Draws for a program (e.g. /filter_draws CEC)" },
    BotCommand { command: "crs_trend", description: "Rolling average CRS chart (e.g. /crs_trend 20)" },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Draws { count: usize },
    FilterDraws { code: String, count: usize },
    CrsTrend { count: usize },
    /// Known command, bad or missing arguments.
    Usage(&'static str),
    Unknown(String),
}

/// Parse a chat message. None for text that is not a command.
pub fn parse(text: &str) -> Option<Command> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    // "/draws@SomeBot" in group chats
    let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    let cmd = match name.as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "draws" => match parse_count(args.first(), DEFAULT_DRAWS_COUNT) {
            Some(count) => Command::Draws { count },
            None => Command::Usage(DRAWS_USAGE),
        },
        "filter_draws" => match args.first() {
            None => Command::Usage(FILTER_USAGE),
            Some(code) => match parse_count(args.get(1), DEFAULT_FILTER_COUNT) {
                Some(count) => Command::FilterDraws { code: code.to_string(), count },
                None => Command::Usage(FILTER_USAGE),
            },
        },
        "crs_trend" => match parse_count(args.first(), DEFAULT_TREND_COUNT) {
            Some(count) => Command::CrsTrend { count },
            None => Command::Usage(TREND_USAGE),
        },
        _ => Command::Unknown(head.to_string()),
    };
    Some(cmd)
}

pub const DRAWS_USAGE: &str = "Usage: /draws [count], e.g. /draws 5";
pub const FILTER_USAGE: &str = "Usage: /filter_draws <code> [count], e.g. /filter_draws CEC";
pub const TREND_USAGE: &str = "Usage: /crs_trend [count], e.g. /crs_trend 20";

/// Missing → default; non-numeric → None; otherwise clamped to 1..=MAX_DRAW_COUNT.
fn parse_count(arg: Option<&&str>, default: usize) -> Option<usize> {
    match arg {
        None => Some(default),
        Some(s) => s
            .parse::<usize>()
            .ok()
            .map(|n| n.clamp(1, MAX_DRAW_COUNT)),
    }
}
