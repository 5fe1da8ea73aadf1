//! Input field handling for the terminal user interface.

/// A single-line text input with a cursor and active state.
///
/// `cursor` counts characters, not bytes, so multi-byte input edits cleanly.
#[derive(Clone, Debug, Default)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
    pub active: bool,
}

impl InputField {
    /// Create a new empty input field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input field with initial text value, cursor at the end.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
            active: false,
        }
    }

    /// Byte offset of the character at `cursor`.
    fn byte_index(&self, cursor: usize) -> usize {
        self.value
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    /// Insert a character at the current cursor position.
    pub fn handle_char(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.value.insert(idx, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if self.cursor > 0 {
            let idx = self.byte_index(self.cursor - 1);
            self.value.remove(idx);
            self.cursor -= 1;
        }
    }

    /// Delete the character at the cursor position.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.char_len() {
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    /// Move cursor one position to the left.
    pub fn move_cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// Move cursor one position to the right.
    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Empty the field.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_and_backspace() {
        let mut field = InputField::new();
        for c in "milk".chars() {
            field.handle_char(c);
        }
        assert_eq!(field.value, "milk");
        field.handle_backspace();
        assert_eq!(field.value, "mil");
        assert_eq!(field.cursor, 3);
    }

    #[test]
    fn test_insert_in_middle() {
        let mut field = InputField::with_value("ac");
        field.move_cursor_left();
        field.handle_char('b');
        assert_eq!(field.value, "abc");
        field.move_cursor_home();
        field.handle_delete();
        assert_eq!(field.value, "bc");
        field.move_cursor_end();
        field.handle_delete();
        assert_eq!(field.value, "bc");
    }

    #[test]
    fn test_multibyte_characters() {
        let mut field = InputField::with_value("café");
        assert_eq!(field.cursor, 4);
        field.handle_backspace();
        assert_eq!(field.value, "caf");
        field.handle_char('é');
        field.handle_char('!');
        assert_eq!(field.value, "café!");
        field.move_cursor_left();
        field.move_cursor_left();
        field.handle_backspace();
        assert_eq!(field.value, "caé!");
    }

    #[test]
    fn test_cursor_bounds() {
        let mut field = InputField::new();
        field.move_cursor_left();
        field.handle_backspace();
        assert_eq!(field.cursor, 0);
        field.handle_char('x');
        field.move_cursor_right();
        assert_eq!(field.cursor, 1);
        field.clear();
        assert_eq!(field.value, "");
        assert_eq!(field.cursor, 0);
    }
}
