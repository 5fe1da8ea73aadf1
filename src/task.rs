//! Task data structure and related functionality.
//!
//! This module defines the `Task` record held by the task list: an opaque id,
//! a title, a free-text "about" description and a completion flag.

use serde::{Deserialize, Serialize};

/// A single to-do item.
///
/// The `id` is the sole identity key. It is assigned once by the task list and
/// never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub about: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Create a new, not yet completed task.
    pub fn new(id: impl Into<String>, title: impl Into<String>, about: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            about: about.into(),
            completed: false,
        }
    }

    /// Text handed to an external share mechanism.
    pub fn share_message(&self) -> String {
        format!("Task: {}\nAbout: {}", self.title, self.about)
    }
}

/// True when both fields carry something besides whitespace.
pub fn is_valid_input(title: &str, about: &str) -> bool {
    !title.trim().is_empty() && !about.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_open() {
        let task = Task::new("1", "Buy milk", "2%");
        assert_eq!(task.id, "1");
        assert!(!task.completed);
    }

    #[test]
    fn test_share_message() {
        let task = Task::new("1", "Buy milk", "2%");
        assert_eq!(task.share_message(), "Task: Buy milk\nAbout: 2%");
    }

    #[test]
    fn test_is_valid_input() {
        assert!(is_valid_input("a", "b"));
        assert!(is_valid_input("  a ", "\tb"));
        assert!(!is_valid_input("", "b"));
        assert!(!is_valid_input("a", "   "));
        assert!(!is_valid_input(" \n", "\t"));
    }

    #[test]
    fn test_missing_completed_defaults_to_false() {
        let task: Task = serde_json::from_str(r#"{"id":"7","title":"t","about":"a"}"#).unwrap();
        assert!(!task.completed);
    }
}
