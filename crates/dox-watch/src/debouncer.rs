//! Change debouncing.
//!
//! Editors routinely emit several filesystem events per save (temp file,
//! rename, metadata touch). One debouncer serves every watched tree: it
//! keeps a single pending change per (area, path) pair and only releases
//! it after a quiet window, coalescing overlapping event kinds along the
//! way. Changes come out oldest deadline first, so an edit in the docs
//! tree and one in the blog tree are replayed in the order they settled.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::event::{ChangeEvent, ChangeKind, WatchArea};

/// A pending change waiting out its quiet window.
struct PendingChange {
    kind: ChangeKind,
    deadline: Instant,
}

/// Thread-safe debouncer shared by all watched content trees.
pub(crate) struct ChangeDebouncer {
    pending: Mutex<HashMap<(WatchArea, PathBuf), PendingChange>>,
    quiet_window: Duration,
}

impl ChangeDebouncer {
    pub(crate) fn new(quiet_window: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            quiet_window,
        }
    }

    /// Record a raw change, folding it into any pending change for the
    /// same file and resetting that file's quiet window.
    ///
    /// Callable from watcher callbacks on any thread.
    pub(crate) fn record(&self, area: WatchArea, path: PathBuf, kind: ChangeKind) {
        let mut pending = self.pending.lock().unwrap();
        let deadline = Instant::now() + self.quiet_window;

        match pending.entry((area, path)) {
            Entry::Vacant(entry) => {
                entry.insert(PendingChange { kind, deadline });
            }
            Entry::Occupied(mut entry) => {
                if let Some(kind) = coalesce(entry.get().kind, kind) {
                    *entry.get_mut() = PendingChange { kind, deadline };
                } else {
                    // Added then Removed within the window: the file never
                    // existed as far as consumers are concerned.
                    entry.remove();
                }
            }
        }
    }

    /// Take every change whose quiet window has elapsed, oldest first.
    pub(crate) fn drain_ready(&self) -> Vec<ChangeEvent> {
        let mut pending = self.pending.lock().unwrap();
        let now = Instant::now();

        let mut ready: Vec<(Instant, ChangeEvent)> = Vec::new();
        pending.retain(|(area, path), change| {
            if change.deadline > now {
                return true;
            }
            ready.push((
                change.deadline,
                ChangeEvent {
                    area: *area,
                    path: path.clone(),
                    kind: change.kind,
                },
            ));
            false
        });

        ready.sort_by_key(|(deadline, _)| *deadline);
        ready.into_iter().map(|(_, event)| event).collect()
    }
}

/// Fold a newly observed change into the pending one for the same file.
///
/// `None` means the pair cancels out and the file drops from the queue.
fn coalesce(pending: ChangeKind, observed: ChangeKind) -> Option<ChangeKind> {
    use ChangeKind::{Added, Modified, Removed};

    Some(match (pending, observed) {
        // The file appeared and vanished without anyone seeing it.
        (Added, Removed) => return None,
        // A pending add swallows edits; a re-add after an edit is still
        // an add from the consumer's point of view (save via rename).
        (Added, _) | (Modified, Added) => Added,
        // Delete followed by create is a replacement.
        (Removed, Added) => Modified,
        (Modified, observed) => observed,
        // Stray events after a delete do not resurrect the file.
        (Removed, _) => Removed,
    })
}
