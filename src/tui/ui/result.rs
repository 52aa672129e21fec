//! Prediction result and attribution chart.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::application::{Assessment, MAX_DISPLAY};
use crate::domain::{Explanation, HgbPrediction};
use crate::tui::styles::MedicalTheme;

use super::waterfall::WaterfallChart;

/// What the result panel shows.
#[derive(Debug, Default)]
pub enum ResultView {
    /// Nothing submitted yet
    #[default]
    Empty,
    /// Prediction succeeded; the explanation may still have failed
    Assessed(Box<Assessment>),
    /// Submission failed before a prediction was produced
    Failed(String),
}

/// Render the result panel
pub fn render_result(f: &mut Frame, area: Rect, view: &ResultView, enabled: bool) {
    match view {
        ResultView::Empty => render_idle(f, area, enabled),
        ResultView::Failed(message) => render_error(f, area, message),
        ResultView::Assessed(assessment) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(7), Constraint::Min(0)])
                .split(area);

            render_metric(f, chunks[0], &assessment.outcome.prediction);
            match &assessment.explanation {
                Ok(explanation) => render_explanation(f, chunks[1], explanation),
                Err(e) => render_explanation_error(f, chunks[1], &e.to_string()),
            }
        }
    }
}

fn render_idle(f: &mut Frame, area: Rect, enabled: bool) {
    let hint = if enabled {
        Span::styled("Fill in the form and press Enter", MedicalTheme::text_muted())
    } else {
        Span::styled(
            "Prediction disabled: model artifacts are unavailable",
            MedicalTheme::warning(),
        )
    };

    let content = Paragraph::new(vec![Line::from(""), Line::from(hint)])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        );

    f.render_widget(content, area);
}

fn render_metric(f: &mut Frame, area: Rect, prediction: &HgbPrediction) {
    let content = Paragraph::new(vec![
        Line::from(Span::styled("预测HGB值", MedicalTheme::text_secondary())),
        Line::from(Span::styled(
            prediction.display_value(),
            MedicalTheme::title().add_modifier(Modifier::UNDERLINED),
        )),
        Line::from(Span::styled(
            format!("较输血前变化 {:+.2} g/L", prediction.delta()),
            MedicalTheme::delta(prediction.delta()),
        )),
        Line::from(Span::styled(
            "注：预测结果仅供参考，实际临床决策需结合其他检查指标",
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title(Span::styled(" Prediction ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border_focused()),
    );

    f.render_widget(content, area);
}

fn render_explanation(f: &mut Frame, area: Rect, explanation: &Explanation) {
    let block = Block::default()
        .title(Span::styled(" 特征影响分析 ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(4)])
        .margin(1)
        .split(inner);

    let rows = explanation.waterfall(MAX_DISPLAY);
    f.render_widget(
        WaterfallChart::new(&rows, explanation.baseline, explanation.prediction),
        chunks[0],
    );

    let legend = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("█ ", MedicalTheme::contribution(1.0)),
            Span::styled("raises the prediction  ", MedicalTheme::text_secondary()),
            Span::styled("█ ", MedicalTheme::contribution(-1.0)),
            Span::styled("lowers the prediction", MedicalTheme::text_secondary()),
        ]),
        Line::from(Span::styled(
            "Bar length is the size of the effect in g/L.",
            MedicalTheme::text_muted(),
        )),
        Line::from(vec![
            Span::styled("Base value E[f(x)] = ", MedicalTheme::text_secondary()),
            Span::styled(format!("{:.2} g/L", explanation.baseline), MedicalTheme::text()),
            Span::styled(
                " (mean model prediction over the training data)",
                MedicalTheme::text_muted(),
            ),
        ]),
    ])
    .wrap(Wrap { trim: true });

    f.render_widget(legend, chunks[1]);
}

fn render_explanation_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Explanation unavailable", MedicalTheme::warning())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(" 特征影响分析 ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Prediction failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}
