//! Waterfall chart of feature contributions

use crate::explainability::Attribution;
use serde::{Deserialize, Serialize};

/// Default number of rows drawn, including the aggregate row
pub const DEFAULT_MAX_DISPLAY: usize = 10;

const POSITIVE_COLOR: &str = "#ff0051";
const NEGATIVE_COLOR: &str = "#008bfb";

/// One horizontal bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallBar {
    pub label: String,
    /// Preprocessed feature value; `None` for the aggregate row
    pub feature_value: Option<f64>,
    pub contribution: f64,
    /// Running total before this bar
    pub start: f64,
    /// Running total after this bar
    pub end: f64,
}

/// Contributions laid out from the baseline up to the model output.
///
/// `bars` are in display order, largest magnitude first. The running total
/// accumulates from the bottom row, so the last bar starts at `base_value` and
/// the first one ends at the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallChart {
    pub base_value: f64,
    pub output: f64,
    pub bars: Vec<WaterfallBar>,
}

impl WaterfallChart {
    pub fn from_attribution(attribution: &Attribution, max_display: usize) -> Self {
        let sorted = attribution.sorted_contributions();
        let max_display = max_display.max(1);

        let (shown, rest) = if sorted.len() > max_display {
            sorted.split_at(max_display - 1)
        } else {
            (sorted.as_slice(), &[][..])
        };

        let mut rows: Vec<(String, Option<f64>, f64)> = shown
            .iter()
            .map(|c| (c.feature_name.clone(), Some(c.feature_value), c.contribution))
            .collect();
        if !rest.is_empty() {
            let total: f64 = rest.iter().map(|c| c.contribution).sum();
            rows.push((format!("{} other features", rest.len()), None, total));
        }

        let mut running = attribution.base_value;
        let mut bars: Vec<WaterfallBar> = rows
            .into_iter()
            .rev()
            .map(|(label, feature_value, contribution)| {
                let start = running;
                running += contribution;
                WaterfallBar {
                    label,
                    feature_value,
                    contribution,
                    start,
                    end: running,
                }
            })
            .collect();
        bars.reverse();

        Self {
            base_value: attribution.base_value,
            output: running,
            bars,
        }
    }

    /// Render as a standalone SVG document
    pub fn to_svg(&self, width: u32) -> String {
        let row_h = 28.0;
        let label_w = 200.0;
        let value_w = 70.0;
        let top = 36.0;
        let bottom = 44.0;
        let w = f64::from(width.max(400));
        let h = top + bottom + row_h * self.bars.len() as f64;

        let mut lo = self.base_value.min(self.output);
        let mut hi = self.base_value.max(self.output);
        for bar in &self.bars {
            lo = lo.min(bar.start.min(bar.end));
            hi = hi.max(bar.start.max(bar.end));
        }
        if hi - lo < 1e-12 {
            hi = lo + 1e-3;
        }
        let plot_w = w - label_w - value_w;
        let x = |v: f64| label_w + (v - lo) / (hi - lo) * plot_w;

        let mut out = String::new();
        out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.0}\" height=\"{h:.0}\" viewBox=\"0 0 {w:.0} {h:.0}\" font-family=\"sans-serif\" font-size=\"12\">"
        ));

        let fx = x(self.output);
        out.push_str(&format!(
            "<line x1=\"{fx:.2}\" y1=\"{:.2}\" x2=\"{fx:.2}\" y2=\"{:.2}\" stroke=\"#888\" stroke-dasharray=\"3,3\"/>",
            top - 8.0,
            h - bottom
        ));
        out.push_str(&format!(
            "<text x=\"{fx:.2}\" y=\"{:.2}\" text-anchor=\"middle\">f(x) = {:.3}</text>",
            top - 14.0,
            self.output
        ));

        for (i, bar) in self.bars.iter().enumerate() {
            let y = top + row_h * i as f64;
            let (x0, x1) = (x(bar.start.min(bar.end)), x(bar.start.max(bar.end)));
            let color = if bar.contribution >= 0.0 { POSITIVE_COLOR } else { NEGATIVE_COLOR };
            let label = match bar.feature_value {
                Some(v) => format!("{} = {:.3}", bar.label, v),
                None => bar.label.clone(),
            };
            out.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\">{}</text>",
                label_w - 8.0,
                y + row_h * 0.6,
                escape_xml(&label)
            ));
            out.push_str(&format!(
                "<rect x=\"{x0:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{color}\"/>",
                y + 4.0,
                (x1 - x0).max(1.0),
                row_h - 8.0
            ));
            out.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" fill=\"{color}\">{:+.3}</text>",
                x1 + 4.0,
                y + row_h * 0.6,
                bar.contribution
            ));
        }

        let bx = x(self.base_value);
        let axis_y = h - bottom;
        out.push_str(&format!(
            "<line x1=\"{label_w:.2}\" y1=\"{axis_y:.2}\" x2=\"{:.2}\" y2=\"{axis_y:.2}\" stroke=\"#333\"/>",
            label_w + plot_w
        ));
        out.push_str(&format!(
            "<line x1=\"{bx:.2}\" y1=\"{top:.2}\" x2=\"{bx:.2}\" y2=\"{:.2}\" stroke=\"#888\" stroke-dasharray=\"3,3\"/>",
            axis_y + 8.0
        ));
        out.push_str(&format!(
            "<text x=\"{bx:.2}\" y=\"{:.2}\" text-anchor=\"middle\">E[f(X)] = {:.3}</text>",
            axis_y + 24.0,
            self.base_value
        ));
        out.push_str("</svg>");
        out
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
