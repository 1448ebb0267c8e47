//! The content watcher.
//!
//! One [`ContentWatcher`] owns the notify backends for the docs tree and
//! the optional blog tree, a debouncer shared across both, and the
//! invalidation loop that applies debounced changes to the shared cache
//! before broadcasting a reload notification.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc, watch};

use dox_content::EXTENSIONS;
use dox_site::ContentCache;

use crate::debouncer::ChangeDebouncer;
use crate::event::{ChangeEvent, ChangeKind, ReloadEvent, WatchArea};

/// Default quiet window for coalescing file events.
const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// How often the invalidation loop drains the debouncers.
const DRAIN_INTERVAL: Duration = Duration::from_millis(50);

/// Lifecycle state of the watcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatcherState {
    /// Not watching; `start` may be called.
    Stopped,
    /// Backends are being set up.
    Starting,
    /// At least one content tree is being watched.
    Watching,
}

/// Watches content trees and keeps the shared cache honest.
///
/// `start` is idempotent and must run inside a tokio runtime; it spawns
/// the record and drain tasks. A missing content directory is logged and
/// left unwatched without affecting the other tree.
pub struct ContentWatcher {
    docs_dir: PathBuf,
    blog_dir: Option<PathBuf>,
    cache: Arc<ContentCache>,
    broadcaster: broadcast::Sender<ReloadEvent>,
    debounce: Duration,
    state: Mutex<WatcherState>,
    watchers: Mutex<Vec<RecommendedWatcher>>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl ContentWatcher {
    /// Create a watcher over the docs tree and an optional blog tree.
    #[must_use]
    pub fn new(
        docs_dir: PathBuf,
        blog_dir: Option<PathBuf>,
        cache: Arc<ContentCache>,
        broadcaster: broadcast::Sender<ReloadEvent>,
    ) -> Self {
        Self {
            docs_dir,
            blog_dir,
            cache,
            broadcaster,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            state: Mutex::new(WatcherState::Stopped),
            watchers: Mutex::new(Vec::new()),
            shutdown: Mutex::new(None),
        }
    }

    /// Set the quiet window in milliseconds.
    #[must_use]
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce = Duration::from_millis(debounce_ms);
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WatcherState {
        *self.state.lock().unwrap()
    }

    /// Get a receiver for reload events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.broadcaster.subscribe()
    }

    /// Start watching. A no-op when already starting or watching.
    ///
    /// Backend failures and missing directories are logged per tree; when
    /// no tree could be watched the watcher returns to `Stopped`.
    pub fn start(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if *state != WatcherState::Stopped {
                return;
            }
            *state = WatcherState::Starting;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let debouncer = Arc::new(ChangeDebouncer::new(self.debounce));

        let mut areas: Vec<(WatchArea, PathBuf)> = vec![(WatchArea::Docs, self.docs_dir.clone())];
        if let Some(blog_dir) = &self.blog_dir {
            areas.push((WatchArea::Blog, blog_dir.clone()));
        }

        // Each watched tree feeds the one shared debouncer.
        let mut roots: Vec<(WatchArea, PathBuf)> = Vec::new();
        for (area, dir) in areas {
            if !dir.is_dir() {
                tracing::warn!(
                    area = ?area,
                    path = %dir.display(),
                    "Content directory missing, not watching"
                );
                continue;
            }
            match self.start_area(area, &dir, &debouncer) {
                Ok(watcher) => {
                    self.watchers.lock().unwrap().push(watcher);
                    roots.push((area, dir));
                }
                Err(e) => {
                    tracing::warn!(
                        area = ?area,
                        path = %dir.display(),
                        error = %e,
                        "Failed to start watch backend"
                    );
                }
            }
        }

        let mut state = self.state.lock().unwrap();
        if roots.is_empty() {
            *state = WatcherState::Stopped;
            return;
        }

        tracing::info!(trees = roots.len(), "Content watcher running");

        // One drain task applies settled changes from every tree, in the
        // order they settled, until shutdown.
        let cache = Arc::clone(&self.cache);
        let broadcaster = self.broadcaster.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(DRAIN_INTERVAL);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        for change in debouncer.drain_ready() {
                            let Some((_, root)) =
                                roots.iter().find(|(area, _)| *area == change.area)
                            else {
                                continue;
                            };
                            handle_change(&change, root, &cache, &broadcaster);
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        *self.shutdown.lock().unwrap() = Some(shutdown_tx);
        *state = WatcherState::Watching;
    }

    /// Stop watching and release the backends.
    pub fn stop(&self) {
        if let Some(shutdown) = self.shutdown.lock().unwrap().take() {
            let _ = shutdown.send(true);
        }
        self.watchers.lock().unwrap().clear();
        *self.state.lock().unwrap() = WatcherState::Stopped;
    }

    /// Set up the notify backend and record task for one content tree.
    fn start_area(
        &self,
        area: WatchArea,
        dir: &Path,
        debouncer: &Arc<ChangeDebouncer>,
    ) -> Result<RecommendedWatcher, notify::Error> {
        let (tx, mut rx) = mpsc::channel::<Event>(100);

        // The callback runs on notify's own thread, so blocking_send is fine.
        let mut backend = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;
        backend.watch(dir, RecursiveMode::Recursive)?;

        // Record task: raw notify events into the debouncer. Exits when the
        // backend is dropped and the channel closes.
        let debouncer = Arc::clone(debouncer);
        let root = dir.to_path_buf();
        let patterns = content_patterns();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                record_event(&event, area, &root, &patterns, &debouncer);
            }
        });

        Ok(backend)
    }
}

/// Glob patterns matching recognized content files.
fn content_patterns() -> Vec<glob::Pattern> {
    EXTENSIONS
        .iter()
        .filter_map(|ext| glob::Pattern::new(&format!("**/*.{ext}")).ok())
        .collect()
}

/// Record a raw notify event into the debouncer.
fn record_event(
    event: &Event,
    area: WatchArea,
    root: &Path,
    patterns: &[glob::Pattern],
    debouncer: &ChangeDebouncer,
) {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Added,
        EventKind::Modify(_) => ChangeKind::Modified,
        EventKind::Remove(_) => ChangeKind::Removed,
        _ => return,
    };

    for path in &event.paths {
        if !matches_patterns(path, root, patterns) {
            continue;
        }
        debouncer.record(area, path.clone(), kind);
        tracing::debug!(?area, path = %path.display(), ?kind, "Recorded filesystem event");
    }
}

/// Check whether a path is a content file inside the watched root.
fn matches_patterns(path: &Path, root: &Path, patterns: &[glob::Pattern]) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    let relative_str = relative.to_string_lossy();
    patterns.iter().any(|p| p.matches(&relative_str))
}

/// Apply one debounced change to the cache and broadcast the reload.
fn handle_change(
    change: &ChangeEvent,
    root: &Path,
    cache: &ContentCache,
    broadcaster: &broadcast::Sender<ReloadEvent>,
) {
    let Some(slug) = compute_slug(&change.path, root) else {
        return;
    };

    match change.area {
        WatchArea::Docs => match change.kind {
            // A new file changes the tree shape but no cached page body.
            ChangeKind::Added => cache.clear_navigation(),
            // An edit stales one page; the tree shape is unchanged.
            ChangeKind::Modified => cache.invalidate_doc(&slug),
            ChangeKind::Removed => {
                cache.invalidate_doc(&slug);
                cache.clear_navigation();
            }
        },
        WatchArea::Blog => {
            match change.kind {
                ChangeKind::Added => {}
                ChangeKind::Modified | ChangeKind::Removed => cache.invalidate_post(&slug),
            }
            cache.clear_blog_list();
        }
    }

    let _ = broadcaster.send(ReloadEvent::new(change.area, format!("/{slug}")));

    tracing::info!(
        area = ?change.area,
        kind = ?change.kind,
        slug,
        "Content change processed"
    );
}

/// Derive the content slug from an absolute file path.
///
/// Mirrors indexing: extension stripped, `/`-separated, an `index` leaf
/// collapsing into its parent directory path.
fn compute_slug(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;

    let segments: Vec<String> = relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        return None;
    }

    let slug = if segments.len() > 1 && segments.last().is_some_and(|s| s == "index") {
        segments[..segments.len() - 1].join("/")
    } else {
        segments.join("/")
    };
    Some(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::SystemTime;

    use dox_content::DocMeta;
    use dox_content::Document;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_content_watcher_is_send_sync() {
        assert_send_sync::<ContentWatcher>();
    }

    fn sample_doc(slug: &str) -> Document {
        Document {
            slug: slug.to_owned(),
            meta: DocMeta::default(),
            content: String::new(),
            path: PathBuf::from(format!("{slug}.md")),
            version: None,
        }
    }

    #[test]
    fn test_compute_slug_simple_and_nested() {
        let root = PathBuf::from("/docs");
        assert_eq!(
            compute_slug(&PathBuf::from("/docs/guide.md"), &root),
            Some("guide".to_owned())
        );
        assert_eq!(
            compute_slug(&PathBuf::from("/docs/api/reference.mdx"), &root),
            Some("api/reference".to_owned())
        );
    }

    #[test]
    fn test_compute_slug_index_collapses() {
        let root = PathBuf::from("/docs");
        assert_eq!(
            compute_slug(&PathBuf::from("/docs/guide/index.md"), &root),
            Some("guide".to_owned())
        );
        assert_eq!(
            compute_slug(&PathBuf::from("/docs/index.md"), &root),
            Some("index".to_owned())
        );
    }

    #[test]
    fn test_compute_slug_outside_root() {
        let root = PathBuf::from("/docs");
        assert_eq!(compute_slug(&PathBuf::from("/other/guide.md"), &root), None);
    }

    #[test]
    fn test_matches_patterns_content_extensions() {
        let root = PathBuf::from("/docs");
        let patterns = content_patterns();

        assert!(matches_patterns(
            &PathBuf::from("/docs/guide.md"),
            &root,
            &patterns
        ));
        assert!(matches_patterns(
            &PathBuf::from("/docs/nested/page.mdx"),
            &root,
            &patterns
        ));
        assert!(!matches_patterns(
            &PathBuf::from("/docs/image.png"),
            &root,
            &patterns
        ));
        assert!(!matches_patterns(
            &PathBuf::from("/elsewhere/guide.md"),
            &root,
            &patterns
        ));
    }

    #[test]
    fn test_docs_modify_invalidates_only_that_doc() {
        let cache = ContentCache::new();
        let mtime = SystemTime::now();
        cache.put_doc("guide", sample_doc("guide"), mtime);
        cache.put_doc("other", sample_doc("other"), mtime);
        cache.put_navigation(Vec::new());
        let (tx, mut rx) = broadcast::channel(8);

        let change = ChangeEvent {
            area: WatchArea::Docs,
            path: PathBuf::from("/docs/guide.md"),
            kind: ChangeKind::Modified,
        };
        handle_change(&change, Path::new("/docs"), &cache, &tx);

        assert!(cache.get_doc("guide", |_| Some(mtime)).is_none());
        assert!(cache.get_doc("other", |_| Some(mtime)).is_some());
        assert!(cache.get_navigation().is_some());

        let event = rx.try_recv().unwrap();
        assert_eq!(event.area, WatchArea::Docs);
        assert_eq!(event.path, "/guide");
    }

    #[test]
    fn test_docs_add_clears_navigation_only() {
        let cache = ContentCache::new();
        let mtime = SystemTime::now();
        cache.put_doc("guide", sample_doc("guide"), mtime);
        cache.put_navigation(Vec::new());
        let (tx, _rx) = broadcast::channel(8);

        let change = ChangeEvent {
            area: WatchArea::Docs,
            path: PathBuf::from("/docs/new-page.md"),
            kind: ChangeKind::Added,
        };
        handle_change(&change, Path::new("/docs"), &cache, &tx);

        assert!(cache.get_navigation().is_none());
        assert!(cache.get_doc("guide", |_| Some(mtime)).is_some());
    }

    #[test]
    fn test_docs_remove_invalidates_doc_and_navigation() {
        let cache = ContentCache::new();
        let mtime = SystemTime::now();
        cache.put_doc("guide", sample_doc("guide"), mtime);
        cache.put_navigation(Vec::new());
        let (tx, _rx) = broadcast::channel(8);

        let change = ChangeEvent {
            area: WatchArea::Docs,
            path: PathBuf::from("/docs/guide.md"),
            kind: ChangeKind::Removed,
        };
        handle_change(&change, Path::new("/docs"), &cache, &tx);

        assert!(cache.get_doc("guide", |_| Some(mtime)).is_none());
        assert!(cache.get_navigation().is_none());
    }

    #[test]
    fn test_blog_events_clear_listing() {
        let cache = ContentCache::new();
        cache.put_blog_list(Vec::new());
        let (tx, mut rx) = broadcast::channel(8);

        let change = ChangeEvent {
            area: WatchArea::Blog,
            path: PathBuf::from("/blog/launch.md"),
            kind: ChangeKind::Added,
        };
        handle_change(&change, Path::new("/blog"), &cache, &tx);

        assert!(cache.get_blog_list().is_none());
        let event = rx.try_recv().unwrap();
        assert_eq!(event.area, WatchArea::Blog);
        assert_eq!(event.path, "/launch");
    }

    #[test]
    fn test_change_outside_root_is_ignored() {
        let cache = ContentCache::new();
        cache.put_navigation(Vec::new());
        let (tx, mut rx) = broadcast::channel(8);

        let change = ChangeEvent {
            area: WatchArea::Docs,
            path: PathBuf::from("/elsewhere/guide.md"),
            kind: ChangeKind::Removed,
        };
        handle_change(&change, Path::new("/docs"), &cache, &tx);

        assert!(cache.get_navigation().is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_start_with_missing_dirs_stays_stopped() {
        let (tx, _rx) = broadcast::channel(8);
        let watcher = ContentWatcher::new(
            PathBuf::from("/nonexistent/docs"),
            Some(PathBuf::from("/nonexistent/blog")),
            Arc::new(ContentCache::new()),
            tx,
        );

        watcher.start();
        assert_eq!(watcher.state(), WatcherState::Stopped);
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_stop_resets() {
        let temp = tempfile::tempdir().unwrap();
        let (tx, _rx) = broadcast::channel(8);
        let watcher = ContentWatcher::new(
            temp.path().to_path_buf(),
            None,
            Arc::new(ContentCache::new()),
            tx,
        );

        watcher.start();
        assert_eq!(watcher.state(), WatcherState::Watching);

        // Second start is a no-op.
        watcher.start();
        assert_eq!(watcher.state(), WatcherState::Watching);

        watcher.stop();
        assert_eq!(watcher.state(), WatcherState::Stopped);
    }

    #[tokio::test]
    async fn test_missing_blog_dir_does_not_block_docs() {
        let temp = tempfile::tempdir().unwrap();
        let (tx, _rx) = broadcast::channel(8);
        let watcher = ContentWatcher::new(
            temp.path().to_path_buf(),
            Some(PathBuf::from("/nonexistent/blog")),
            Arc::new(ContentCache::new()),
            tx,
        );

        watcher.start();
        assert_eq!(watcher.state(), WatcherState::Watching);
        watcher.stop();
    }

    // Timing-sensitive end-to-end test; flaky in constrained environments.
    #[tokio::test]
    #[ignore]
    async fn test_modification_reaches_subscribers() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("guide.md"), "# Original").unwrap();

        let (tx, mut rx) = broadcast::channel(8);
        let watcher = ContentWatcher::new(
            temp.path().to_path_buf(),
            None,
            Arc::new(ContentCache::new()),
            tx,
        )
        .with_debounce_ms(20);

        watcher.start();
        tokio::time::sleep(Duration::from_millis(200)).await;

        std::fs::write(temp.path().join("guide.md"), "# Updated").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for reload event")
            .expect("channel closed");
        assert_eq!(event.path, "/guide");

        watcher.stop();
    }
}
