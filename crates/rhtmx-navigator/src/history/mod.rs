/// History backends
///
/// The navigator decides *where* to go; a backend owns the address bar. URLs
/// exchanged with a backend include the base path.

mod memory;

pub use memory::MemoryHistory;

use crate::route::Route;

/// URL side effects of navigation
pub trait HistoryBackend: Send + Sync {
    /// URL currently shown, including the base path
    fn current_location(&self) -> String;

    /// Adds a new entry
    fn push_url(&self, url: &str);

    /// Overwrites the current entry
    fn replace_url(&self, url: &str);

    /// Makes the shown URL equal to `current`
    fn ensure_url(&self, current: &str, push: bool) {
        if self.current_location() != current {
            if push {
                self.push_url(current);
            } else {
                self.replace_url(current);
            }
        }
    }

    /// Moves `n` entries through the history; returns the URL landed on
    fn go(&self, n: isize) -> Option<String>;

    /// Called once after the initial navigation
    fn setup_listeners(&self) {}

    /// Called on teardown
    fn teardown_listeners(&self) {}

    /// Adjusts scroll after a navigation (or a same-route hash change)
    fn handle_scroll(&self, _to: &Route, _from: &Route, _is_pop: bool) {}
}
