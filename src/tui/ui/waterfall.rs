//! Horizontal waterfall chart of per-feature contributions.
//!
//! Rows are drawn top to bottom in the order given (largest magnitude first).
//! Each bar spans its cumulative `start..end` on a shared axis, so walking up
//! from the bottom row moves from the baseline `E[f(x)]` to the prediction `f(x)`.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Span,
    widgets::Widget,
};

use crate::domain::WaterfallRow;
use crate::tui::styles::MedicalTheme;

/// Width reserved right of the bars for the signed value.
const VALUE_WIDTH: u16 = 9;

/// Narrowest area worth drawing into.
const MIN_WIDTH: u16 = 24;

pub struct WaterfallChart<'a> {
    rows: &'a [WaterfallRow],
    baseline: f64,
    prediction: f64,
}

impl<'a> WaterfallChart<'a> {
    #[must_use]
    pub fn new(rows: &'a [WaterfallRow], baseline: f64, prediction: f64) -> Self {
        Self {
            rows,
            baseline,
            prediction,
        }
    }

    fn label(row: &WaterfallRow) -> String {
        match &row.display_value {
            Some(value) => format!("{} = {}", row.label, value),
            None => row.label.clone(),
        }
    }

    /// Axis range covering every bar plus both reference points.
    fn domain(&self) -> (f64, f64) {
        let points = self
            .rows
            .iter()
            .flat_map(|r| [r.start, r.end])
            .chain([self.baseline, self.prediction]);

        let (lo, hi) = points.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if hi - lo < f64::EPSILON {
            (lo - 1.0, hi + 1.0)
        } else {
            (lo, hi)
        }
    }
}

fn text_width(text: &str) -> u16 {
    u16::try_from(Span::raw(text).width()).unwrap_or(u16::MAX)
}

impl Widget for WaterfallChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 2 || area.width < MIN_WIDTH || self.rows.is_empty() {
            return;
        }

        let labels: Vec<String> = self.rows.iter().map(Self::label).collect();
        let label_width = labels
            .iter()
            .map(|l| text_width(l))
            .max()
            .unwrap_or(0)
            .min(area.width * 2 / 5);

        let bar_x = area.x + label_width + 1;
        let bar_width = area.width.saturating_sub(label_width + 1 + VALUE_WIDTH);
        if bar_width < 2 {
            return;
        }

        let (lo, hi) = self.domain();
        let column = |v: f64| -> u16 {
            let t = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
            // t is within [0, 1], so the offset fits in bar_width
            bar_x + (t * f64::from(bar_width - 1)).round() as u16
        };

        let chart_rows = usize::from(area.height - 1).min(self.rows.len());
        for (i, (row, label)) in self.rows.iter().zip(&labels).take(chart_rows).enumerate() {
            let y = area.y + i as u16;

            let offset = label_width.saturating_sub(text_width(label));
            buf.set_stringn(
                area.x + offset,
                y,
                label,
                usize::from(label_width),
                MedicalTheme::text_secondary(),
            );

            let style = MedicalTheme::contribution(row.value);
            if row.value == 0.0 {
                buf[(column(row.start), y)]
                    .set_symbol("│")
                    .set_style(MedicalTheme::text_muted());
            } else {
                let from = column(row.start.min(row.end));
                let to = column(row.start.max(row.end));
                for x in from..=to {
                    buf[(x, y)].set_symbol("█").set_style(style);
                }
            }

            buf.set_stringn(
                bar_x + bar_width,
                y,
                format!(" {:+.2}", row.value),
                usize::from(VALUE_WIDTH),
                style,
            );
        }

        let axis_y = area.y + chart_rows as u16;
        for x in bar_x..bar_x + bar_width {
            buf[(x, axis_y)]
                .set_symbol("─")
                .set_style(MedicalTheme::border());
        }
        buf[(column(self.baseline), axis_y)]
            .set_symbol("┴")
            .set_style(MedicalTheme::text());
        buf[(column(self.prediction), axis_y)]
            .set_symbol("┴")
            .set_style(MedicalTheme::focused());

        let axis_label = format!("E[f(x)] {:.2} → f(x) {:.2}", self.baseline, self.prediction);
        let offset = label_width.saturating_sub(text_width(&axis_label));
        buf.set_stringn(
            area.x + offset,
            axis_y,
            &axis_label,
            usize::from(label_width),
            MedicalTheme::text_muted(),
        );
    }
}
