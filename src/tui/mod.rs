//! TUI module: Terminal User Interface using Ratatui.
//!
//! One screen: the clinical input form on the left, the prediction and its
//! feature attribution chart on the right.

mod app;
mod styles;
pub mod ui;

pub use app::App;
pub use styles::MedicalTheme;
