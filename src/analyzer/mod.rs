pub mod rolling;

pub use rolling::{analyze_rolling_average, sort_chronological, Insufficiency, RollingSeries};
