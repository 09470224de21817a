pub mod renderer;

pub use renderer::{ChartRenderer, QuickChartRenderer};
