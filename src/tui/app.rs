//! Main TUI application loop.
//!
//! Handles:
//! - Input event handling
//! - Synchronous submission through the assessment service

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::application::AssessmentService;
use crate::domain::FieldKind;

use super::ui::{
    form::{render_form, FormState},
    render_disclaimer, render_header,
    result::{render_result, ResultView},
    render_startup_errors,
};

/// Main application state
pub struct App {
    service: AssessmentService,
    form_state: FormState,
    result: ResultView,
    should_quit: bool,
}

impl App {
    /// Create the application around an already started service.
    #[must_use]
    pub fn new(service: AssessmentService) -> Self {
        Self {
            service,
            form_state: FormState::default(),
            result: ResultView::default(),
            should_quit: false,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let startup_errors = self.service.startup_errors();
                let banner_height = if startup_errors.is_empty() {
                    0
                } else {
                    u16::try_from(startup_errors.len()).unwrap_or(u16::MAX).saturating_add(3)
                };

                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(2),
                        Constraint::Length(banner_height),
                        Constraint::Min(0),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                render_header(f, rows[0]);
                if !startup_errors.is_empty() {
                    render_startup_errors(f, rows[1], startup_errors);
                }

                let columns = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                    .split(rows[2]);

                let enabled = self.service.is_ready();
                render_form(f, columns[0], &self.form_state, enabled);
                render_result(f, columns[1], &self.result, enabled);

                render_disclaimer(f, rows[3]);
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('q') | KeyCode::Char('c') => self.should_quit = true,
                KeyCode::Char('r') => {
                    self.form_state.reset();
                    self.result = ResultView::Empty;
                }
                _ => {}
            }
            return;
        }

        let on_choice =
            self.form_state.fields[self.form_state.selected_field].descriptor.kind == FieldKind::Binary;

        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::BackTab => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Left | KeyCode::Right => self.form_state.toggle_choice(),
            KeyCode::Char(' ') if on_choice => self.form_state.toggle_choice(),
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Delete => self.form_state.clear_field(),
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn submit(&mut self) {
        // A stale result must never outlive a new submission
        self.result = ResultView::Empty;

        if !self.service.is_ready() {
            self.form_state.error_message =
                Some("Prediction is disabled until the model artifacts load".to_string());
            return;
        }

        let input = match self.form_state.to_clinical_input() {
            Ok(input) => input,
            Err(errors) => {
                self.form_state.error_message = Some(errors.join("; "));
                return;
            }
        };
        self.form_state.error_message = None;

        self.result = match self.service.assess(&input) {
            Ok(assessment) => {
                tracing::info!("Prediction completed");
                ResultView::Assessed(Box::new(assessment))
            }
            Err(e) => {
                tracing::error!("Prediction failed: {e}");
                ResultView::Failed(e.to_string())
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ArtifactLoader, ArtifactPaths};
    use crate::domain::schema::GENDER;
    use std::path::Path;

    fn bundled_app() -> App {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let loaded = ArtifactLoader::default().load(&ArtifactPaths::in_dir(&dir));
        App::new(AssessmentService::from_loaded(loaded))
    }

    #[test]
    fn test_submit_defaults_shows_assessment() {
        let mut app = bundled_app();
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);

        match &app.result {
            ResultView::Assessed(assessment) => {
                assert!((assessment.outcome.prediction.predicted - 96.7).abs() < 1e-6);
                assert!(assessment.explanation.is_ok());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_submission_clears_previous_result() {
        let mut app = bundled_app();
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert!(matches!(app.result, ResultView::Assessed(_)));

        app.handle_key(KeyCode::Delete, KeyModifiers::NONE);
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);

        assert!(matches!(app.result, ResultView::Empty));
        let message = app.form_state.error_message.as_deref().unwrap_or_default();
        assert!(message.contains("Age"));
    }

    #[test]
    fn test_submit_disabled_without_artifacts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let loaded = ArtifactLoader::default().load(&ArtifactPaths::in_dir(temp.path()));
        let mut app = App::new(AssessmentService::from_loaded(loaded));

        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert!(matches!(app.result, ResultView::Empty));
        assert!(app.form_state.error_message.is_some());
    }

    #[test]
    fn test_space_toggles_gender_only_on_choice_field() {
        let mut app = bundled_app();
        app.handle_key(KeyCode::Down, KeyModifiers::NONE);
        app.handle_key(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(app.form_state.fields[GENDER].value, "女");

        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }
}
