//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Headings, borders and the primary accent.
pub const INDIGO: Color = Color::Rgb(59, 59, 152);
/// Completed marker and the confirm button.
pub const TEAL: Color = Color::Rgb(56, 173, 169);
/// Struck-through text of completed tasks.
pub const PALE_GREEN: Color = Color::Rgb(184, 233, 148);
/// Destructive actions.
pub const CORAL: Color = Color::Rgb(238, 82, 83);
/// Focused input and edit accents.
pub const AMBER: Color = Color::Rgb(246, 185, 59);
/// Light background used for the welcome screen.
pub const SKY: Color = Color::Rgb(227, 240, 255);
