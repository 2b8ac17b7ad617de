//! Workspace-wide resolution progress.
//!
//! Tracks how many conflicts remain in each file and notifies subscribers
//! when a count changes. Reports are idempotent: re-reporting a file's
//! current count fires nothing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Identifies one registered progress subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ProgressCallback = Box<dyn Fn(&Path, usize) + Send>;

/// Remaining-conflict counts across files.
#[derive(Default)]
pub struct ResolutionProgress {
    remaining: HashMap<PathBuf, usize>,
    subscribers: Vec<(SubscriptionId, ProgressCallback)>,
    next_id: u64,
}

impl ResolutionProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the number of unresolved conflicts left in `path`, notifying
    /// subscribers only when the count actually changed.
    pub fn report_marker_count(&mut self, path: &Path, count: usize) {
        if self.remaining.get(path) == Some(&count) {
            return;
        }
        debug!(path = %path.display(), count, "conflict count updated");
        self.remaining.insert(path.to_path_buf(), count);
        for (_, callback) in &self.subscribers {
            callback(path, count);
        }
    }

    /// The last reported count for `path`, or `None` if never reported.
    pub fn remaining(&self, path: &Path) -> Option<usize> {
        self.remaining.get(path).copied()
    }

    /// Whether every reported file has reached zero conflicts.
    pub fn is_empty(&self) -> bool {
        self.remaining.values().all(|&count| count == 0)
    }

    /// Register a callback for count changes.
    pub fn on_did_update<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&Path, usize) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }
}

impl std::fmt::Debug for ResolutionProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionProgress")
            .field("remaining", &self.remaining)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_reports_and_queries_counts() {
        let mut progress = ResolutionProgress::new();
        assert!(progress.is_empty());
        assert_eq!(progress.remaining(Path::new("a.txt")), None);

        progress.report_marker_count(Path::new("a.txt"), 3);
        assert_eq!(progress.remaining(Path::new("a.txt")), Some(3));
        assert!(!progress.is_empty());

        progress.report_marker_count(Path::new("a.txt"), 0);
        assert!(progress.is_empty());
    }

    #[test]
    fn test_duplicate_reports_do_not_notify() {
        let mut progress = ResolutionProgress::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        progress.on_did_update(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        progress.report_marker_count(Path::new("a.txt"), 2);
        progress.report_marker_count(Path::new("a.txt"), 2);
        progress.report_marker_count(Path::new("a.txt"), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut progress = ResolutionProgress::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let id = progress.on_did_update(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        progress.report_marker_count(Path::new("a.txt"), 2);
        progress.unsubscribe(id);
        progress.report_marker_count(Path::new("a.txt"), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
