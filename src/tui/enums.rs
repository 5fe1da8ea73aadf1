//! Enumerations for TUI state management.

/// Screen the terminal user interface is showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    Welcome,
    TaskList,
    AddTask,
    EditTask,
    Share,
    Help,
    Confirm,
}
