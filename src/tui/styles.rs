//! Colours and text styles for the HGB terminal.
//!
//! Contribution colours follow the waterfall convention used by SHAP plots:
//! red pushes the prediction up, blue pulls it down.

use ratatui::style::{Color, Modifier, Style};

/// Palette shared by the header, form, result panel and waterfall chart.
pub struct MedicalTheme;

impl MedicalTheme {
    /// Feature contribution that raises predicted HGB.
    pub const SHAP_POSITIVE: Color = Color::Rgb(255, 0, 81); // #FF0051

    /// Feature contribution that lowers predicted HGB.
    pub const SHAP_NEGATIVE: Color = Color::Rgb(0, 139, 251); // #008BFB

    const ACCENT: Color = Color::Rgb(13, 148, 136); // #0D9488
    const ACCENT_LIGHT: Color = Color::Rgb(45, 212, 191); // #2DD4BF
    const FRAME: Color = Color::Rgb(148, 163, 184); // #94A3B8

    const RISE: Color = Color::Rgb(16, 185, 129); // #10B981
    const FALL: Color = Color::Rgb(251, 191, 36); // #FBBF24
    const ALERT: Color = Color::Rgb(244, 63, 94); // #F43F5E

    const INK: Color = Color::Rgb(248, 250, 252); // #F8FAFC
    const INK_DIM: Color = Color::Rgb(148, 163, 184); // #94A3B8
    const INK_FAINT: Color = Color::Rgb(100, 116, 139); // #64748B

    /// Predicted HGB minus pre-transfusion HGB. A rise is green, a fall amber.
    #[must_use]
    pub fn delta(value: f64) -> Style {
        let color = if value >= 0.0 { Self::RISE } else { Self::FALL };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Bar and value colour for one waterfall row.
    #[must_use]
    pub fn contribution(value: f64) -> Style {
        let color = if value >= 0.0 {
            Self::SHAP_POSITIVE
        } else {
            Self::SHAP_NEGATIVE
        };
        Style::default().fg(color)
    }

    /// Block cursor drawn after the value of the field being edited.
    #[must_use]
    pub fn cursor() -> Style {
        Style::default()
            .fg(Self::ACCENT_LIGHT)
            .add_modifier(Modifier::SLOW_BLINK)
    }

    // Form chrome

    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::ACCENT_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::FRAME)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::ACCENT)
    }

    /// Key name in the footer hints, e.g. `Enter`.
    #[must_use]
    pub fn key_hint() -> Style {
        Self::focused()
    }

    #[must_use]
    pub fn key_desc() -> Style {
        Self::text_secondary()
    }

    // Text

    #[must_use]
    pub fn title() -> Style {
        Style::default().fg(Self::INK).add_modifier(Modifier::BOLD)
    }

    /// Panel headings such as "Prediction" and "Feature contributions".
    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::ACCENT_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::INK)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::INK_DIM)
    }

    /// Captions, units and the disclaimer.
    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::INK_FAINT)
    }

    // Status

    /// Explanation unavailable, out-of-range hints.
    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::FALL)
    }

    /// Startup failures and rejected submissions.
    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::ALERT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_colour_tracks_direction() {
        assert_eq!(MedicalTheme::delta(3.5).fg, Some(MedicalTheme::RISE));
        assert_eq!(MedicalTheme::delta(0.0).fg, Some(MedicalTheme::RISE));
        assert_eq!(MedicalTheme::delta(-0.1).fg, Some(MedicalTheme::FALL));
        assert!(MedicalTheme::delta(-0.1).add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_contribution_colour_tracks_sign() {
        assert_eq!(
            MedicalTheme::contribution(10.68).fg,
            Some(MedicalTheme::SHAP_POSITIVE)
        );
        assert_eq!(
            MedicalTheme::contribution(-5.7).fg,
            Some(MedicalTheme::SHAP_NEGATIVE)
        );
    }

    #[test]
    fn test_delta_fall_matches_warning() {
        assert_eq!(MedicalTheme::delta(-2.0).fg, MedicalTheme::warning().fg);
    }
}
