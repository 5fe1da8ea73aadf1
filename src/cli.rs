use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Simple, file-backed daily task list.
/// Storage defaults to ~/.todo or a directory passed via --dir.
#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Plan your day: a small task list CLI and TUI")]
pub struct Cli {
    /// Directory holding the task list.
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Keep tasks in memory only; nothing is saved.
    #[arg(long, global = true, conflicts_with = "dir")]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
