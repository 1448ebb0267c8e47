use std::sync::Arc;

use dox_site::DocLibrary;
use dox_watch::ContentWatcher;

/// Shared application state passed to every handler.
pub struct AppState {
    /// Content library backing the documentation and blog endpoints.
    pub library: Arc<DocLibrary>,
    /// File watcher, present when live reload is enabled.
    pub watcher: Option<Arc<ContentWatcher>>,
}

impl AppState {
    #[must_use]
    pub fn new(library: Arc<DocLibrary>, watcher: Option<Arc<ContentWatcher>>) -> Self {
        Self { library, watcher }
    }
}
