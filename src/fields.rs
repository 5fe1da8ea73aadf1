//! Enumerations used to select and present tasks.

use clap::ValueEnum;

use crate::task::Task;

/// Which tasks a listing shows.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Open,
    Done,
}

impl Filter {
    /// Whether `task` passes this filter.
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Open => !task.completed,
            Filter::Done => task.completed,
        }
    }

    /// Cycle All -> Open -> Done -> All.
    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Open,
            Filter::Open => Filter::Done,
            Filter::Done => Filter::All,
        }
    }

    /// Label for display.
    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Open => "Open",
            Filter::Done => "Done",
        }
    }
}
