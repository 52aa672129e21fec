//! Clinical input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::domain::schema::{AGE, GENDER, HEIGHT, HGB_BEFORE, TRANSFUSION_UNITS, WEIGHT};
use crate::domain::{reference, ClinicalInput, FieldDescriptor, FieldKind, Gender};
use crate::tui::styles::MedicalTheme;

/// One input box, bound to a schema field.
#[derive(Debug, Clone)]
pub struct FormField {
    pub descriptor: &'static FieldDescriptor,
    pub value: String,
}

impl FormField {
    fn hint(&self) -> String {
        let d = self.descriptor;
        match d.kind {
            FieldKind::Binary => "[←/→] 男 / 女".to_string(),
            _ => format!("{} ({}-{})", d.unit, d.min, d.max),
        }
    }

    fn title(&self) -> String {
        format!(" {} {} ", self.descriptor.column, self.descriptor.label)
    }
}

/// Form state
pub struct FormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for FormState {
    fn default() -> Self {
        let defaults = ClinicalInput::default().to_feature_vector();
        let fields = defaults
            .iter()
            .map(|(descriptor, value)| FormField {
                descriptor,
                value: raw_text(descriptor, value),
            })
            .collect();

        Self {
            fields,
            selected_field: 0,
            error_message: None,
        }
    }
}

/// Text shown in a field for a raw feature value.
fn raw_text(descriptor: &FieldDescriptor, value: f64) -> String {
    match descriptor.kind {
        FieldKind::Integer => format!("{value:.0}"),
        FieldKind::Continuous => format!("{value:.1}"),
        FieldKind::Binary if value >= 0.5 => Gender::Male.label().to_string(),
        FieldKind::Binary => Gender::Female.label().to_string(),
    }
}

impl FormState {
    fn current(&mut self) -> &mut FormField {
        &mut self.fields[self.selected_field]
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field.
    ///
    /// Integer fields take digits only; decimal fields also take one `.`.
    pub fn input_char(&mut self, c: char) {
        let field = self.current();
        let accepted = match field.descriptor.kind {
            FieldKind::Integer => c.is_ascii_digit(),
            FieldKind::Continuous => c.is_ascii_digit() || (c == '.' && !field.value.contains('.')),
            FieldKind::Binary => false,
        };
        if accepted {
            field.value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        let field = self.current();
        if field.descriptor.kind != FieldKind::Binary {
            field.value.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        let field = self.current();
        if field.descriptor.kind != FieldKind::Binary {
            field.value.clear();
        }
    }

    /// Switch the gender choice when it is the selected field.
    pub fn toggle_choice(&mut self) {
        let field = self.current();
        if field.descriptor.kind == FieldKind::Binary {
            let gender = Gender::from_label(&field.value).unwrap_or(Gender::Female);
            field.value = gender.toggled().label().to_string();
            self.error_message = None;
        }
    }

    /// Restore the default values
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Parse and validate the form into a submission.
    ///
    /// # Errors
    /// Returns one message per unparseable or out-of-range field.
    pub fn to_clinical_input(&self) -> Result<ClinicalInput, Vec<String>> {
        let mut errors = Vec::new();

        let mut integer = |field: &FormField| -> u32 {
            field.value.trim().parse::<u32>().unwrap_or_else(|_| {
                errors.push(format!("{}: enter a whole number", field.descriptor.label));
                0
            })
        };
        let age = integer(&self.fields[AGE]);
        let transfusion_units = integer(&self.fields[TRANSFUSION_UNITS]);
        let hgb_before = integer(&self.fields[HGB_BEFORE]);

        let mut decimal = |field: &FormField| -> f64 {
            field.value.trim().parse::<f64>().unwrap_or_else(|_| {
                errors.push(format!("{}: enter a number", field.descriptor.label));
                0.0
            })
        };
        let height_cm = decimal(&self.fields[HEIGHT]);
        let weight_kg = decimal(&self.fields[WEIGHT]);

        let gender = Gender::from_label(&self.fields[GENDER].value).unwrap_or_else(|e| {
            errors.push(e);
            Gender::Male
        });

        if !errors.is_empty() {
            return Err(errors);
        }

        let input = ClinicalInput {
            age,
            gender,
            height_cm,
            weight_kg,
            transfusion_units,
            hgb_before,
        };
        input.validate()?;
        Ok(input)
    }
}

/// Render the input form with usage notes and key hints
pub fn render_form(f: &mut Frame, area: Rect, state: &FormState, enabled: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(11), // Fields
            Constraint::Min(0),     // Usage notes
            Constraint::Length(3),  // Footer/error
        ])
        .split(area);

    render_form_fields(f, chunks[0], state);
    render_usage_notes(f, chunks[1]);
    render_form_footer(f, chunks[2], state, enabled);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &FormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = (state.fields.len() + 1) / 2;

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(field.title(), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        if field.value.is_empty() {
            spans.push(Span::styled(field.hint(), MedicalTheme::text_muted()));
        } else {
            spans.push(Span::styled(field.value.clone(), MedicalTheme::text()));
            if !field.descriptor.unit.is_empty() {
                spans.push(Span::styled(
                    format!(" {}", field.descriptor.unit),
                    MedicalTheme::text_muted(),
                ));
            }
        }
        if is_selected {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_usage_notes(f: &mut Frame, area: Rect) {
    let range = |(lo, hi): (f64, f64)| format!("{lo:.0}-{hi:.0} g/L");
    let text = vec![
        Line::from(Span::styled("使用说明", MedicalTheme::subtitle())),
        Line::from(Span::styled(
            "Enter the six values and press Enter to predict.",
            MedicalTheme::text_secondary(),
        )),
        Line::from(Span::styled(
            "输血量单位: 1U = 200ml 全血制备的浓缩红细胞",
            MedicalTheme::text_secondary(),
        )),
        Line::from(vec![
            Span::styled("HGB 正常参考范围: ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("男 {}, 女 {}", range(reference::MALE), range(reference::FEMALE)),
                MedicalTheme::text(),
            ),
        ]),
    ];

    let notes = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(MedicalTheme::border()),
        );

    f.render_widget(notes, area);
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &FormState, enabled: bool) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        let submit_style = if enabled {
            MedicalTheme::key_hint()
        } else {
            MedicalTheme::text_muted()
        };
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Gender ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", submit_style),
            Span::styled("Predict ", MedicalTheme::key_desc()),
            Span::styled("[Ctrl+R] ", MedicalTheme::key_hint()),
            Span::styled("Reset ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse_to_default_input() {
        let state = FormState::default();
        assert_eq!(state.fields.len(), 6);
        assert_eq!(state.fields[AGE].value, "30");
        assert_eq!(state.fields[GENDER].value, "男");
        assert_eq!(state.fields[HEIGHT].value, "170.0");
        assert_eq!(state.fields[HGB_BEFORE].value, "120");

        let input = state.to_clinical_input().expect("defaults are valid");
        assert_eq!(input, ClinicalInput::default());
    }

    #[test]
    fn test_each_field_maps_to_its_input() {
        let mut state = FormState::default();
        state.fields[AGE].value = "64".into();
        state.fields[GENDER].value = "女".into();
        state.fields[HEIGHT].value = "158.5".into();
        state.fields[WEIGHT].value = "52.0".into();
        state.fields[TRANSFUSION_UNITS].value = "3".into();
        state.fields[HGB_BEFORE].value = "75".into();

        let input = state.to_clinical_input().expect("valid");
        assert_eq!(input.age, 64);
        assert_eq!(input.gender, Gender::Female);
        assert!((input.height_cm - 158.5).abs() < f64::EPSILON);
        assert!((input.weight_kg - 52.0).abs() < f64::EPSILON);
        assert_eq!(input.transfusion_units, 3);
        assert_eq!(input.hgb_before, 75);
    }

    #[test]
    fn test_integer_field_rejects_decimal_point() {
        let mut state = FormState::default();
        state.clear_field();
        for c in "4.5x".chars() {
            state.input_char(c);
        }
        assert_eq!(state.fields[AGE].value, "45");
    }

    #[test]
    fn test_decimal_field_takes_one_point() {
        let mut state = FormState::default();
        state.selected_field = HEIGHT;
        state.clear_field();
        for c in "158.5.2".chars() {
            state.input_char(c);
        }
        assert_eq!(state.fields[HEIGHT].value, "158.52");
    }

    #[test]
    fn test_gender_toggle() {
        let mut state = FormState::default();
        state.toggle_choice();
        assert_eq!(state.fields[GENDER].value, "男", "toggle only acts on the gender field");

        state.next_field();
        state.toggle_choice();
        assert_eq!(state.fields[GENDER].value, "女");
        state.delete_char();
        assert_eq!(state.fields[GENDER].value, "女");

        let input = state.to_clinical_input().expect("valid");
        assert_eq!(input.gender, Gender::Female);
    }

    #[test]
    fn test_empty_field_is_reported() {
        let mut state = FormState::default();
        state.selected_field = WEIGHT;
        state.clear_field();
        let errors = state.to_clinical_input().expect_err("must fail");
        assert_eq!(errors, vec!["Weight: enter a number".to_string()]);
    }

    #[test]
    fn test_out_of_range_is_reported() {
        let mut state = FormState::default();
        state.fields[AGE].value = "101".into();
        state.fields[TRANSFUSION_UNITS].value = "13".into();
        let errors = state.to_clinical_input().expect_err("must fail");
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Age"));
        assert!(errors[1].starts_with("Transfusion"));
    }

    #[test]
    fn test_boundaries_accepted() {
        let mut state = FormState::default();
        for (field, value) in state.fields.iter_mut().zip(["100", "女", "250", "10", "12", "20"]) {
            field.value = value.to_string();
        }
        let input = state.to_clinical_input().expect("valid");
        assert_eq!(input.age, 100);
        assert_eq!(input.transfusion_units, 12);
        assert!((input.height_cm - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut state = FormState::default();
        state.prev_field();
        assert_eq!(state.selected_field, 5);
        state.next_field();
        assert_eq!(state.selected_field, 0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = FormState::default();
        state.fields[AGE].value = "7".into();
        state.error_message = Some("x".into());
        state.selected_field = TRANSFUSION_UNITS;
        state.reset();
        assert_eq!(state.fields[AGE].value, "30");
        assert_eq!(state.selected_field, 0);
        assert!(state.error_message.is_none());
    }
}
