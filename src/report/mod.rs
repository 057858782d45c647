//! Presentation of an assessment: downloadable text report and waterfall chart

pub mod chart;
pub mod text;

pub use chart::{WaterfallBar, WaterfallChart};
pub use text::{factor_lines, render_report_text, REPORT_FILENAME};

/// Probability formatted as a percentage with two decimals (`63.21%`)
pub fn format_percent(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}
