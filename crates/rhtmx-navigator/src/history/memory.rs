use std::sync::Mutex;

use super::HistoryBackend;
use crate::record::lock;

#[derive(Debug)]
struct Entries {
    stack: Vec<String>,
    index: usize,
}

/// In-memory history: an entry stack and a cursor, like a browser tab
///
/// # Examples
///
/// ```
/// use rhtmx_navigator::history::{HistoryBackend, MemoryHistory};
///
/// let history = MemoryHistory::new("/");
/// history.push_url("/a");
/// history.push_url("/b");
/// assert_eq!(history.go(-1).as_deref(), Some("/a"));
/// history.push_url("/c");
/// assert_eq!(history.entries(), vec!["/", "/a", "/c"]);
/// assert_eq!(history.go(1), None);
/// ```
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Entries>,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                stack: vec![initial.into()],
                index: 0,
            }),
        }
    }

    /// All entries, oldest first
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).stack.clone()
    }

    /// Position of the current entry
    pub fn index(&self) -> usize {
        lock(&self.entries).index
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HistoryBackend for MemoryHistory {
    fn current_location(&self) -> String {
        let entries = lock(&self.entries);
        entries.stack[entries.index].clone()
    }

    fn push_url(&self, url: &str) {
        let mut entries = lock(&self.entries);
        let next = entries.index + 1;
        entries.stack.truncate(next);
        entries.stack.push(url.to_string());
        entries.index = next;
    }

    fn replace_url(&self, url: &str) {
        let mut entries = lock(&self.entries);
        let index = entries.index;
        entries.stack[index] = url.to_string();
    }

    fn go(&self, n: isize) -> Option<String> {
        let mut entries = lock(&self.entries);
        let target = entries.index.checked_add_signed(n)?;
        let url = entries.stack.get(target)?.clone();
        entries.index = target;
        Some(url)
    }
}
