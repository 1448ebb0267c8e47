//! Content watching for dox.
//!
//! Watches the docs and blog trees with `notify`, coalesces raw
//! filesystem events per path, applies the matching cache invalidation,
//! and emits one [`ReloadEvent`] per debounced change on a broadcast
//! channel that transport layers (the WebSocket endpoint) subscribe to.

mod debouncer;
mod event;
mod watcher;

pub use event::{ChangeEvent, ChangeKind, ReloadEvent, WatchArea};
pub use watcher::{ContentWatcher, WatcherState};
