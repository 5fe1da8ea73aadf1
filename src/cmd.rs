//! Command implementations for the CLI interface.
//!
//! Each handler resolves its arguments against the loaded task list, calls
//! one state operation and reports the outcome. Unknown or ambiguous task
//! identifiers are reported here, before the list is touched.

use std::io::{self, BufRead, Write};

use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::db::*;
use crate::fields::Filter;
use crate::store::KeyValueStore;
use crate::tui::run::run_tui;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive UI interface (default).
    Ui,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// What the task is about.
        about: String,
    },

    /// List tasks in the order they were added.
    List {
        /// Which tasks to show.
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
    },

    /// View a single task by ID or title.
    View {
        /// Task ID or title to view
        id: String,
    },

    /// Change the title and/or about of a task.
    Edit {
        /// Task ID or title to edit
        id: String,
        /// New title. Keeps the current one if omitted.
        #[arg(long)]
        title: Option<String>,
        /// New about text. Keeps the current one if omitted.
        #[arg(long)]
        about: Option<String>,
    },

    /// Mark a task done, or open again if it already is.
    Toggle {
        /// Task ID or title to toggle
        id: String,
    },

    /// Delete a task by ID or title.
    Delete {
        /// Task ID or title to delete
        id: String,
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },

    /// Print a task as a shareable message.
    Share {
        /// Task ID or title to share
        id: String,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Resolve `id` or exit with a message.
fn resolve_or_exit<S: KeyValueStore>(id: &str, list: &TaskList<S>) -> String {
    match resolve_task_identifier(id, list) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error resolving task: {}", e);
            std::process::exit(1);
        }
    }
}

/// Launch the terminal user interface.
pub fn cmd_ui<S: KeyValueStore>(list: TaskList<S>) {
    if let Err(e) = run_tui(list) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Add a new task to the list.
pub fn cmd_add<S: KeyValueStore>(list: &mut TaskList<S>, title: String, about: String) {
    let before = list.len();
    list.add(&title, &about);
    if list.len() == before {
        eprintln!("Title and about must not be empty.");
        std::process::exit(1);
    }
    if let Some(task) = list.tasks().last() {
        println!("Added task {}", task.id);
    }
}

/// List tasks passing `filter`.
pub fn cmd_list<S: KeyValueStore>(list: &TaskList<S>, filter: Filter) {
    let tasks = list.filtered(filter);
    if tasks.is_empty() {
        println!("No tasks yet!");
        return;
    }
    print_table(&tasks);
    println!("\n{} of {} task(s) remaining", list.remaining(), list.len());
}

/// View detailed information about a specific task.
pub fn cmd_view<S: KeyValueStore>(list: &TaskList<S>, id: String) {
    let task_id = resolve_or_exit(&id, list);
    let Some(task) = list.get(&task_id) else {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    };
    println!("ID:        {}", task.id);
    println!("Title:     {}", task.title);
    println!("Completed: {}", if task.completed { "yes" } else { "no" });
    println!("About:\n{}\n", task.about);
}

/// Edit a task, keeping fields that were not given.
pub fn cmd_edit<S: KeyValueStore>(
    list: &mut TaskList<S>,
    id: String,
    title: Option<String>,
    about: Option<String>,
) {
    let task_id = resolve_or_exit(&id, list);
    let Some(task) = list.get(&task_id) else {
        eprintln!("Task {} not found.", task_id);
        std::process::exit(1);
    };
    let title = title.unwrap_or_else(|| task.title.clone());
    let about = about.unwrap_or_else(|| task.about.clone());
    list.edit(&task_id, &title, &about);
    println!("Updated task {}", task_id);
}

/// Flip a task's completion state.
pub fn cmd_toggle<S: KeyValueStore>(list: &mut TaskList<S>, id: String) {
    let task_id = resolve_or_exit(&id, list);
    list.toggle_completed(&task_id);
    match list.get(&task_id) {
        Some(t) if t.completed => println!("Completed task {}", task_id),
        Some(_) => println!("Reopened task {}", task_id),
        None => {}
    }
}

/// Delete a task after confirmation.
pub fn cmd_delete<S: KeyValueStore>(list: &mut TaskList<S>, id: String, yes: bool) {
    let task_id = resolve_or_exit(&id, list);
    if !yes {
        let title = list.get(&task_id).map(|t| t.title.clone()).unwrap_or_default();
        print!("Delete this task? '{}' [y/N] ", title);
        io::stdout().flush().ok();
        let stdin = io::stdin();
        let answer = stdin.lock().lines().next().and_then(|l| l.ok()).unwrap_or_default();
        if !confirmed(&answer) {
            println!("Cancelled.");
            return;
        }
    }
    list.delete(&task_id);
    println!("Deleted task {}", task_id);
}

/// Whether a prompt answer means yes.
pub fn confirmed(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Print the share message of a task.
pub fn cmd_share<S: KeyValueStore>(list: &TaskList<S>, id: String) {
    let task_id = resolve_or_exit(&id, list);
    if let Some(task) = list.get(&task_id) {
        println!("{}", task.share_message());
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
