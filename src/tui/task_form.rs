//! Task form handling for the terminal user interface.
//!
//! The same two-field form serves both adding a task and editing one in place.

use crate::task::Task;
use crate::tui::input::InputField;

/// Field order within the form.
pub const TITLE_FIELD: usize = 0;
pub const ABOUT_FIELD: usize = 1;
const FIELD_COUNT: usize = 2;

/// Title and about inputs plus the focused field.
#[derive(Clone, Debug)]
pub struct TaskForm {
    pub title: InputField,
    pub about: InputField,
    pub current_field: usize,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskForm {
    /// Create an empty form focused on the title.
    pub fn new() -> Self {
        let mut form = Self {
            title: InputField::new(),
            about: InputField::new(),
            current_field: TITLE_FIELD,
        };
        form.update_active_field();
        form
    }

    /// Create a form prefilled from an existing task.
    pub fn from_task(task: &Task) -> Self {
        let mut form = Self {
            title: InputField::with_value(&task.title),
            about: InputField::with_value(&task.about),
            current_field: TITLE_FIELD,
        };
        form.update_active_field();
        form
    }

    /// Move to the next field in the form.
    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// Move to the previous field in the form.
    pub fn prev_field(&mut self) {
        self.current_field = if self.current_field == 0 {
            FIELD_COUNT - 1
        } else {
            self.current_field - 1
        };
        self.update_active_field();
    }

    /// Update which field is currently active for editing.
    pub fn update_active_field(&mut self) {
        self.title.active = self.current_field == TITLE_FIELD;
        self.about.active = self.current_field == ABOUT_FIELD;
    }

    /// The focused input.
    pub fn active_mut(&mut self) -> &mut InputField {
        match self.current_field {
            ABOUT_FIELD => &mut self.about,
            _ => &mut self.title,
        }
    }

    /// Empty both fields and focus the title.
    pub fn clear(&mut self) {
        self.title.clear();
        self.about.clear();
        self.current_field = TITLE_FIELD;
        self.update_active_field();
    }
}
