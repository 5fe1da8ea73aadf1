//! # todo - a small daily task list
//!
//! Create, edit, complete, delete and share short text tasks from the command
//! line or an interactive terminal user interface (TUI). Tasks survive between
//! sessions in a local data directory.
//!
//! ## Quick Start
//!
//! ```bash
//! # Open the interactive UI
//! todo
//!
//! # Add a task via CLI
//! todo add "Buy milk" "2%"
//!
//! # List, complete and share
//! todo list
//! todo toggle "Buy milk"
//! todo share "Buy milk"
//! ```
//!
//! Data is stored in `~/.todo/` (or `--dir`, or `$TODO_DIR`) as a single JSON
//! document. `--memory` runs without touching disk. Set `RUST_LOG=debug` to
//! see what the task list is doing; while the UI is open, logs go to
//! `todo.log` in the data directory.

use std::fs::OpenOptions;
use std::io;

use clap::Parser;
use log::info;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod fields;
pub mod store;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::Config;
use db::TaskList;
use store::open_store;

/// Where log records go.
///
/// The UI owns the terminal, so its logs go to the log file, or nowhere when
/// there is no data directory to hold one.
fn log_target(config: &Config, ui: bool) -> env_logger::Target {
    if !ui {
        return env_logger::Target::Stderr;
    }
    let Some(path) = config.log_path() else {
        return env_logger::Target::Pipe(Box::new(io::sink()));
    };
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => env_logger::Target::Pipe(Box::new(file)),
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", path.display(), e);
            env_logger::Target::Pipe(Box::new(io::sink()))
        }
    }
}

/// Initialise `env_logger`, defaulting to warnings only.
fn setup_logging(config: &Config, ui: bool) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(log_target(config, ui))
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::resolve(cli.dir.as_deref(), cli.memory);

    if let Some(dir) = config.data_dir() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Failed to create data directory {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    }

    let command = cli.command.unwrap_or(Commands::Ui);
    setup_logging(&config, matches!(command, Commands::Ui));

    if let Commands::Completions { shell } = command {
        cmd_completions(shell);
        return;
    }

    let store = match open_store(&config.storage) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open task store: {e}");
            std::process::exit(1);
        }
    };
    let mut list = TaskList::load(store);
    info!("starting with {} task(s)", list.len());

    match command {
        Commands::Ui => cmd_ui(list),
        Commands::Add { title, about } => cmd_add(&mut list, title, about),
        Commands::List { filter } => cmd_list(&list, filter),
        Commands::View { id } => cmd_view(&list, id),
        Commands::Edit { id, title, about } => cmd_edit(&mut list, id, title, about),
        Commands::Toggle { id } => cmd_toggle(&mut list, id),
        Commands::Delete { id, yes } => cmd_delete(&mut list, id, yes),
        Commands::Share { id } => cmd_share(&list, id),
        Commands::Completions { .. } => unreachable!("completions handled above"),
    }
}
