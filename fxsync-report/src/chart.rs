//! Plain-text trend chart: monthly mean line inside its min/max band.

use chrono::NaiveDate;

use crate::trend::MonthlyPoint;

pub const DEFAULT_HEIGHT: usize = 10;

const COLUMN_WIDTH: usize = 4;
const MEAN: char = 'o';
const BAND: char = ':';

/// Render `points` as a fixed-width chart, `height` text rows tall.
///
/// ```text
/// Dollar x BRL Variation
///       5.10 |         o
///       4.95 |     o   :
///       4.80 | o   :
///            +------------
///              Jan Feb Mar
/// ```
pub fn render_trend_chart(title: &str, points: &[MonthlyPoint], height: usize) -> String {
    let mut out = format!("{title}\n");
    if points.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    let height = height.max(2);
    let lo = points.iter().map(|p| p.min).fold(f64::INFINITY, f64::min);
    let hi = points.iter().map(|p| p.max).fold(f64::NEG_INFINITY, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };
    let level = |v: f64| (((v - lo) / span) * (height - 1) as f64).round() as usize;

    let cells: Vec<(usize, usize, usize)> = points
        .iter()
        .map(|p| (level(p.min), level(p.mean), level(p.max)))
        .collect();

    for row in (0..height).rev() {
        let value = lo + span * row as f64 / (height - 1) as f64;
        out.push_str(&format!("{value:>10.2} |"));
        for &(min_row, mean_row, max_row) in &cells {
            let mark = if row == mean_row {
                MEAN
            } else if (min_row..=max_row).contains(&row) {
                BAND
            } else {
                ' '
            };
            out.push_str(&format!(" {mark:<width$}", width = COLUMN_WIDTH - 1));
        }
        trim_trailing(&mut out);
        out.push('\n');
    }

    out.push_str(&format!("{:>10} +{}\n", "", "-".repeat(points.len() * COLUMN_WIDTH)));
    out.push_str(&format!("{:>10}  ", ""));
    for p in points {
        let month = NaiveDate::from_ymd_opt(p.year, p.month, 1)
            .map(|d| d.format("%b").to_string())
            .unwrap_or_else(|| format!("{:02}", p.month));
        out.push_str(&format!("{month:<width$}", width = COLUMN_WIDTH));
    }
    trim_trailing(&mut out);
    out.push('\n');
    out.push_str(&format!("{MEAN} monthly mean   {BAND} monthly min-max\n"));
    out
}

fn trim_trailing(out: &mut String) {
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
}
