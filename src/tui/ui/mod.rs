//! UI module: View components for the TUI.

pub mod form;
pub mod result;
pub mod waterfall;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::adapters::ArtifactError;
use crate::tui::styles::MedicalTheme;

pub fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("血红蛋白(HGB)预测系统", MedicalTheme::title()),
        Span::styled(
            " │ Post-transfusion hemoglobin prediction",
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// Startup failures, shown once above the form while prediction is disabled.
pub fn render_startup_errors(f: &mut Frame, area: Rect, errors: &[ArtifactError]) {
    let mut lines = vec![Line::from(Span::styled(
        "! Prediction disabled",
        MedicalTheme::danger(),
    ))];
    lines.extend(
        errors
            .iter()
            .map(|e| Line::from(Span::styled(e.to_string(), MedicalTheme::text()))),
    );

    let banner = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(banner, area);
}

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: Predictions are for reference only and do not replace clinical judgement.",
            MedicalTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Clinical decisions must take other laboratory findings into account.",
            MedicalTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
