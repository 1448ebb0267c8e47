//! Watch event types.

use std::path::PathBuf;

use serde::Serialize;

/// Which content tree an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchArea {
    /// The docs tree.
    Docs,
    /// The blog tree.
    Blog,
}

/// Kind of filesystem change, after coalescing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new content file appeared.
    Added,
    /// An existing content file changed.
    Modified,
    /// A content file disappeared.
    Removed,
}

/// A debounced content change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Content tree the change belongs to.
    pub area: WatchArea,
    /// Absolute path of the changed file.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: ChangeKind,
}

/// Event sent to connected live-reload clients when content changes.
#[derive(Clone, Debug, Serialize)]
pub struct ReloadEvent {
    /// Event type (always "reload").
    #[serde(rename = "type")]
    pub event_type: String,
    /// Content tree the change belongs to.
    pub area: WatchArea,
    /// Site path of the changed content (e.g. `/guide/setup`).
    pub path: String,
}

impl ReloadEvent {
    pub(crate) fn new(area: WatchArea, path: String) -> Self {
        Self {
            event_type: "reload".to_owned(),
            area,
            path,
        }
    }
}
