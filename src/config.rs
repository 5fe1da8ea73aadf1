//! Runtime configuration: where the task list lives and how it is stored.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DIR_ENV: &str = "TODO_DIR";

/// Name of the directory created under `$HOME` by default.
const DEFAULT_DIR_NAME: &str = ".todo";

/// Log file written while the terminal UI owns the screen.
pub const LOG_FILE: &str = "todo.log";

/// Backing store selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Files under a data directory.
    Dir(PathBuf),
    /// In-process only.
    Memory,
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage: Storage,
}

impl Config {
    /// Resolve settings from command line flags and the environment.
    ///
    /// Precedence for the data directory: `--dir`, then `$TODO_DIR`, then
    /// `$HOME/.todo`, then `./.todo`.
    pub fn resolve(dir: Option<&Path>, memory: bool) -> Self {
        Self::resolve_with(dir, memory, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        dir: Option<&Path>,
        memory: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        if memory {
            return Config {
                storage: Storage::Memory,
            };
        }
        let dir = match dir {
            Some(d) => d.to_path_buf(),
            None => match env(DIR_ENV).filter(|v| !v.is_empty()) {
                Some(d) => PathBuf::from(d),
                None => {
                    let home = env("HOME").unwrap_or_else(|| ".".to_string());
                    PathBuf::from(home).join(DEFAULT_DIR_NAME)
                }
            },
        };
        Config {
            storage: Storage::Dir(dir),
        }
    }

    /// Data directory, if storage is on disk.
    pub fn data_dir(&self) -> Option<&Path> {
        match &self.storage {
            Storage::Dir(d) => Some(d),
            Storage::Memory => None,
        }
    }

    /// Where logs go while the terminal UI runs.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.data_dir().map(|d| d.join(LOG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_of(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_flag_wins() {
        let cfg = Config::resolve_with(
            Some(Path::new("/flag")),
            false,
            env_of(&[("TODO_DIR", "/env"), ("HOME", "/home/u")]),
        );
        assert_eq!(cfg.storage, Storage::Dir(PathBuf::from("/flag")));
    }

    #[test]
    fn test_env_over_home() {
        let cfg = Config::resolve_with(None, false, env_of(&[("TODO_DIR", "/env"), ("HOME", "/home/u")]));
        assert_eq!(cfg.data_dir(), Some(Path::new("/env")));
    }

    #[test]
    fn test_home_default() {
        let cfg = Config::resolve_with(None, false, env_of(&[("TODO_DIR", ""), ("HOME", "/home/u")]));
        assert_eq!(cfg.data_dir(), Some(Path::new("/home/u/.todo")));
        assert_eq!(cfg.log_path(), Some(PathBuf::from("/home/u/.todo/todo.log")));
    }

    #[test]
    fn test_no_home_falls_back_to_cwd() {
        let cfg = Config::resolve_with(None, false, env_of(&[]));
        assert_eq!(cfg.data_dir(), Some(Path::new("./.todo")));
    }

    #[test]
    fn test_memory() {
        let cfg = Config::resolve_with(None, true, env_of(&[("TODO_DIR", "/env")]));
        assert_eq!(cfg.storage, Storage::Memory);
        assert_eq!(cfg.data_dir(), None);
        assert_eq!(cfg.log_path(), None);
    }
}
