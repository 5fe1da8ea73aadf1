//! Task list state and the helpers the command line builds on.
//!
//! `TaskList` owns the ordered collection of tasks and is the only way to
//! change it. Every mutation ends with `persist()`, which writes the whole list
//! to the backing store under [`TASKS_KEY`]. Nothing here ever returns an
//! error: bad input and unknown ids degrade to no-ops, storage failures are
//! logged and swallowed.

use std::collections::HashSet;

use chrono::Utc;
use log::{debug, info, warn};

use crate::fields::Filter;
use crate::store::KeyValueStore;
use crate::task::{is_valid_input, Task};

/// Store key holding the serialized task list.
pub const TASKS_KEY: &str = "TASKS_LIST";

/// Encode tasks as a compact JSON array, in list order.
pub fn serialize_tasks(tasks: &[Task]) -> serde_json::Result<String> {
    serde_json::to_string(tasks)
}

/// Decode the output of [`serialize_tasks`].
pub fn deserialize_tasks(data: &str) -> serde_json::Result<Vec<Task>> {
    serde_json::from_str(data)
}

/// The in-memory task list, synchronized to a key-value store.
#[derive(Debug)]
pub struct TaskList<S: KeyValueStore> {
    tasks: Vec<Task>,
    store: S,
    last_id: i64,
}

impl<S: KeyValueStore> TaskList<S> {
    /// Load the list from `store`, starting empty if nothing usable is there.
    ///
    /// Missing, unreadable and unparseable data all fall back to an empty
    /// list. Loading never writes back.
    pub fn load(store: S) -> Self {
        let tasks = match store.get(TASKS_KEY) {
            Ok(Some(data)) if data.trim().is_empty() => Vec::new(),
            Ok(Some(data)) => match deserialize_tasks(&data) {
                Ok(tasks) => dedup_ids(tasks),
                Err(e) => {
                    warn!("Error parsing task list, starting fresh: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Error reading task list, starting fresh: {e}");
                Vec::new()
            }
        };
        info!("loaded {} task(s)", tasks.len());

        let last_id = tasks
            .iter()
            .filter_map(|t| t.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);

        Self {
            tasks,
            store,
            last_id,
        }
    }

    /// Append a new task. No-op if `title` or `about` is blank.
    ///
    /// The given strings are stored as typed; trimming only gates validity.
    pub fn add(&mut self, title: &str, about: &str) {
        if !is_valid_input(title, about) {
            debug!("add rejected: blank title or about");
            return;
        }
        let id = self.next_id();
        debug!("adding task {id}");
        self.tasks.push(Task::new(id, title, about));
        self.persist();
    }

    /// Replace the title and about of task `id`, keeping its state and position.
    ///
    /// Values are taken verbatim, blank ones included.
    pub fn edit(&mut self, id: &str, title: &str, about: &str) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.title = title.to_string();
            task.about = about.to_string();
            debug!("edited task {id}");
        }
        self.persist();
    }

    /// Flip the completion flag of task `id`.
    pub fn toggle_completed(&mut self, id: &str) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.completed = !task.completed;
            debug!("task {id} completed = {}", task.completed);
        }
        self.persist();
    }

    /// Remove task `id`.
    pub fn delete(&mut self, id: &str) {
        if let Some(idx) = self.tasks.iter().position(|t| t.id == id) {
            self.tasks.remove(idx);
            debug!("deleted task {id}");
        }
        self.persist();
    }

    /// Write the whole list to the store. Failures are logged, never returned.
    fn persist(&mut self) {
        let data = match serialize_tasks(&self.tasks) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to encode task list: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(TASKS_KEY, &data) {
            warn!("Failed to save task list: {e}");
        }
    }

    /// Time-based id, unused in the list and strictly increasing within the
    /// process until the numeric range above the stored ids runs out.
    fn next_id(&mut self) -> String {
        let start = Utc::now()
            .timestamp_millis()
            .max(self.last_id.saturating_add(1));
        // Wraps to the low end when every id up to i64::MAX is taken.
        let candidate = (start..=i64::MAX)
            .chain(0..start)
            .find(|c| self.get(&c.to_string()).is_none())
            .unwrap_or(start);
        self.last_id = self.last_id.max(candidate);
        candidate.to_string()
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Get a task by id.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of tasks not yet completed.
    pub fn remaining(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    /// Tasks passing `filter`, in list order.
    pub fn filtered(&self, filter: Filter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Keep the first occurrence of every id.
fn dedup_ids(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::new();
    let before = tasks.len();
    let kept: Vec<Task> = tasks
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect();
    if kept.len() != before {
        warn!("Dropped {} task(s) with duplicate ids", before - kept.len());
    }
    kept
}

/// Resolve a task identifier (either id or title) to a task id.
/// Returns an error if the title has multiple matches and suggests using the id instead.
pub fn resolve_task_identifier<S: KeyValueStore>(
    identifier: &str,
    list: &TaskList<S>,
) -> Result<String, String> {
    if list.get(identifier).is_some() {
        return Ok(identifier.to_string());
    }

    // Search by title (case-insensitive)
    let needle = identifier.to_lowercase();
    let matches: Vec<&Task> = list
        .tasks()
        .iter()
        .filter(|task| task.title.to_lowercase() == needle)
        .collect();

    match matches.len() {
        0 => Err(format!("No task found with id or title '{}'", identifier)),
        1 => Ok(matches[0].id.clone()),
        _ => {
            let mut error_msg = format!("Multiple tasks found with title '{}':\n", identifier);
            for task in matches {
                error_msg.push_str(&format!("  ID {}: {}\n", task.id, task.title));
            }
            error_msg.push_str("Please use the specific ID instead.");
            Err(error_msg)
        }
    }
}

/// Completion marker used in listings.
pub fn format_completed(completed: bool) -> &'static str {
    if completed {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!("{:<15} {:<4} {:<30} {}", "ID", "", "Title", "About");
    for t in tasks {
        println!(
            "{:<15} {:<4} {:<30} {}",
            t.id,
            format_completed(t.completed),
            truncate(&t.title, 30),
            truncate(&t.about, 50)
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore, StoreError};
    use proptest::prelude::*;
    use tempfile::tempdir;

    /// Store whose writes always fail.
    #[derive(Debug, Default)]
    struct FailingStore {
        attempts: usize,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Io {
                path: "unavailable".into(),
                source: std::io::Error::other("read failed"),
            })
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            self.attempts += 1;
            Err(StoreError::Io {
                path: "unavailable".into(),
                source: std::io::Error::other("write failed"),
            })
        }
    }

    fn empty_list() -> TaskList<MemoryStore> {
        TaskList::load(MemoryStore::new())
    }

    fn persisted<S: KeyValueStore>(list: &TaskList<S>) -> Vec<Task> {
        let data = list.store().get(TASKS_KEY).unwrap().unwrap();
        deserialize_tasks(&data).unwrap()
    }

    #[test]
    fn test_load_missing_is_empty() {
        let list = empty_list();
        assert!(list.is_empty());
        // Loading alone never writes.
        assert_eq!(list.store().get(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn test_load_corrupted_is_empty() {
        for data in ["not json", "{\"id\":1}", "[{\"title\":\"x\"}]", "[", "   "] {
            let list = TaskList::load(MemoryStore::with_entry(TASKS_KEY, data));
            assert!(list.is_empty(), "{data}");
        }
    }

    #[test]
    fn test_load_read_failure_is_empty() {
        let list = TaskList::load(FailingStore::default());
        assert!(list.is_empty());
        assert_eq!(list.store().attempts, 0);
    }

    #[test]
    fn test_load_existing() {
        let data = r#"[{"id":"1","title":"a","about":"b","completed":true},{"id":"2","title":"c","about":"d","completed":false}]"#;
        let list = TaskList::load(MemoryStore::with_entry(TASKS_KEY, data));
        assert_eq!(list.len(), 2);
        assert_eq!(list.tasks()[0].id, "1");
        assert!(list.tasks()[0].completed);
        assert_eq!(list.tasks()[1].title, "c");
    }

    #[test]
    fn test_load_drops_duplicate_ids() {
        let data = r#"[{"id":"1","title":"first","about":"b","completed":false},{"id":"1","title":"second","about":"d","completed":false}]"#;
        let list = TaskList::load(MemoryStore::with_entry(TASKS_KEY, data));
        assert_eq!(list.len(), 1);
        assert_eq!(list.tasks()[0].title, "first");
    }

    #[test]
    fn test_add_appends_and_persists() {
        let mut list = empty_list();
        list.add("Buy milk", "2%");
        list.add("Walk dog", "Around the block");
        assert_eq!(list.len(), 2);
        assert_eq!(list.tasks()[0].title, "Buy milk");
        assert_eq!(list.tasks()[1].title, "Walk dog");
        assert!(list.tasks().iter().all(|t| !t.completed));
        assert_eq!(persisted(&list), list.tasks());
    }

    #[test]
    fn test_add_keeps_input_verbatim() {
        let mut list = empty_list();
        list.add("  padded  ", "\tabout ");
        assert_eq!(list.tasks()[0].title, "  padded  ");
        assert_eq!(list.tasks()[0].about, "\tabout ");
    }

    #[test]
    fn test_add_blank_is_noop() {
        let mut list = empty_list();
        list.add("", "about");
        list.add("title", "");
        list.add("   ", "about");
        list.add("title", "\n\t ");
        assert!(list.is_empty());
        assert_eq!(list.store().get(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut list = empty_list();
        for i in 0..50 {
            list.add(&format!("task {i}"), "about");
        }
        let ids: Vec<i64> = list.tasks().iter().map(|t| t.id.parse().unwrap()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ids_skip_loaded_ids() {
        let future = Utc::now().timestamp_millis() + 1_000_000;
        let data = format!(r#"[{{"id":"{future}","title":"a","about":"b","completed":false}}]"#);
        let mut list = TaskList::load(MemoryStore::with_entry(TASKS_KEY, &data));
        list.add("new", "task");
        let new_id: i64 = list.tasks()[1].id.parse().unwrap();
        assert!(new_id > future);
    }

    #[test]
    fn test_add_after_max_id() {
        let data = format!(
            r#"[{{"id":"{}","title":"a","about":"b","completed":false}}]"#,
            i64::MAX
        );
        let mut list = TaskList::load(MemoryStore::with_entry(TASKS_KEY, &data));
        list.add("new", "task");
        list.add("another", "task");
        assert_eq!(list.len(), 3);
        let ids: HashSet<&str> = list.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(persisted(&list), list.tasks());
    }

    #[test]
    fn test_edit_in_place() {
        let mut list = empty_list();
        list.add("a", "b");
        list.add("c", "d");
        let id = list.tasks()[0].id.clone();
        list.toggle_completed(&id);
        list.edit(&id, "A", "B");

        let task = &list.tasks()[0];
        assert_eq!(task.id, id);
        assert_eq!(task.title, "A");
        assert_eq!(task.about, "B");
        assert!(task.completed);
        assert_eq!(list.tasks()[1].title, "c");
        assert_eq!(persisted(&list), list.tasks());
    }

    #[test]
    fn test_edit_accepts_blank_values() {
        let mut list = empty_list();
        list.add("a", "b");
        let id = list.tasks()[0].id.clone();
        list.edit(&id, "", "  ");
        assert_eq!(list.tasks()[0].title, "");
        assert_eq!(list.tasks()[0].about, "  ");
    }

    #[test]
    fn test_edit_unknown_id_leaves_list_unchanged() {
        let mut list = empty_list();
        list.add("a", "b");
        let before = serialize_tasks(list.tasks()).unwrap();
        list.edit("missing", "x", "y");
        assert_eq!(serialize_tasks(list.tasks()).unwrap(), before);
        assert_eq!(list.store().get(TASKS_KEY).unwrap().unwrap(), before);
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut list = empty_list();
        list.add("a", "b");
        let id = list.tasks()[0].id.clone();
        list.toggle_completed(&id);
        assert!(list.tasks()[0].completed);
        assert_eq!(list.remaining(), 0);
        list.toggle_completed(&id);
        assert!(!list.tasks()[0].completed);
        assert_eq!(list.remaining(), 1);
        assert_eq!(persisted(&list), list.tasks());
    }

    #[test]
    fn test_toggle_unknown_is_noop() {
        let mut list = empty_list();
        list.add("a", "b");
        list.toggle_completed("missing");
        assert!(!list.tasks()[0].completed);
    }

    #[test]
    fn test_delete_twice() {
        let mut list = empty_list();
        list.add("a", "b");
        list.add("c", "d");
        list.add("e", "f");
        let id = list.tasks()[1].id.clone();
        list.delete(&id);
        assert_eq!(list.len(), 2);
        list.delete(&id);
        assert_eq!(list.len(), 2);
        let titles: Vec<&str> = list.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["a", "e"]);
        assert_eq!(persisted(&list), list.tasks());
    }

    #[test]
    fn test_scenario_add_toggle_edit_delete() {
        let mut list = empty_list();
        list.add("Buy milk", "2%");
        assert_eq!(list.len(), 1);
        let id = list.tasks()[0].id.clone();
        assert_eq!(list.tasks()[0].title, "Buy milk");
        assert_eq!(list.tasks()[0].about, "2%");
        assert!(!list.tasks()[0].completed);

        list.toggle_completed(&id);
        assert!(list.get(&id).unwrap().completed);

        list.edit(&id, "Buy oat milk", "2%");
        let task = list.get(&id).unwrap();
        assert_eq!(task.title, "Buy oat milk");
        assert!(task.completed);

        list.delete(&id);
        assert!(list.is_empty());
        assert!(persisted(&list).is_empty());
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let mut list = TaskList::load(FailingStore::default());
        list.add("a", "b");
        let id = list.tasks()[0].id.clone();
        list.toggle_completed(&id);
        list.edit(&id, "c", "d");
        list.delete(&id);
        assert!(list.is_empty());
        assert_eq!(list.store().attempts, 4);
    }

    #[test]
    fn test_file_store_reload() {
        let temp = tempdir().unwrap();
        let id = {
            let mut list = TaskList::load(FileStore::open(temp.path()).unwrap());
            list.add("Buy milk", "2%");
            list.add("Walk dog", "park");
            let id = list.tasks()[0].id.clone();
            list.toggle_completed(&id);
            id
        };
        let list = TaskList::load(FileStore::open(temp.path()).unwrap());
        assert_eq!(list.len(), 2);
        assert_eq!(list.tasks()[0].id, id);
        assert!(list.tasks()[0].completed);
        assert_eq!(list.tasks()[1].title, "Walk dog");
    }

    #[test]
    fn test_filtered() {
        let mut list = empty_list();
        list.add("a", "b");
        list.add("c", "d");
        let id = list.tasks()[0].id.clone();
        list.toggle_completed(&id);
        assert_eq!(list.filtered(Filter::All).len(), 2);
        assert_eq!(list.filtered(Filter::Done)[0].title, "a");
        assert_eq!(list.filtered(Filter::Open)[0].title, "c");
    }

    #[test]
    fn test_resolve_task_identifier() {
        let mut list = empty_list();
        list.add("Buy milk", "2%");
        list.add("Walk dog", "park");
        list.add("walk DOG", "again");
        let id = list.tasks()[0].id.clone();

        assert_eq!(resolve_task_identifier(&id, &list), Ok(id.clone()));
        assert_eq!(resolve_task_identifier("buy MILK", &list), Ok(id));
        assert!(resolve_task_identifier("nothing", &list).is_err());
        let err = resolve_task_identifier("walk dog", &list).unwrap_err();
        assert!(err.starts_with("Multiple tasks found"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    proptest! {
        #[test]
        fn prop_serialize_roundtrip(
            raw in prop::collection::vec((".*", ".*", ".*", any::<bool>()), 0..20)
        ) {
            let tasks: Vec<Task> = raw
                .into_iter()
                .map(|(id, title, about, completed)| Task { id, title, about, completed })
                .collect();
            let data = serialize_tasks(&tasks).unwrap();
            prop_assert_eq!(deserialize_tasks(&data).unwrap(), tasks);
        }

        #[test]
        fn prop_adds_grow_list_by_valid_count(
            inputs in prop::collection::vec(("[ a-z]{0,6}", "[ a-z]{0,6}"), 0..30)
        ) {
            let mut list = empty_list();
            let mut expected = 0;
            for (title, about) in &inputs {
                let before = list.len();
                list.add(title, about);
                if is_valid_input(title, about) {
                    expected += 1;
                    prop_assert_eq!(list.len(), before + 1);
                } else {
                    prop_assert_eq!(list.len(), before);
                }
            }
            prop_assert_eq!(list.len(), expected);
            let ids: HashSet<&str> = list.tasks().iter().map(|t| t.id.as_str()).collect();
            prop_assert_eq!(ids.len(), list.len());
        }
    }
}
