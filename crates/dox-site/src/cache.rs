//! In-memory content cache.
//!
//! One [`ContentCache`] instance is constructed at startup and shared
//! between the library facade (reads, fills) and the watcher's
//! invalidation loop (evicts). Per-slug entries are validated against the
//! on-disk mtime at read time; the navigation tree and the blog listing
//! are time-boxed instead.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};

use dox_content::{BlogPost, Document};

use crate::nav::NavItem;

/// Validity window for the navigation and blog-list entries.
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5);

/// A cached per-slug value with the mtime recorded at parse time.
#[derive(Clone, Debug)]
struct MtimeEntry<T> {
    value: T,
    mtime: SystemTime,
}

/// A cached aggregate value with its storage instant.
#[derive(Clone, Debug)]
struct TimedEntry<T> {
    value: T,
    stored_at: Instant,
}

/// Shared cache for parsed content.
#[derive(Debug)]
pub struct ContentCache {
    docs: Mutex<HashMap<String, MtimeEntry<Document>>>,
    posts: Mutex<HashMap<String, MtimeEntry<BlogPost>>>,
    blog_list: Mutex<Option<TimedEntry<Vec<BlogPost>>>>,
    navigation: Mutex<Option<TimedEntry<Vec<NavItem>>>>,
    max_age: Duration,
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentCache {
    /// Create a cache with the default aggregate validity window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_age(DEFAULT_MAX_AGE)
    }

    /// Create a cache with a custom aggregate validity window.
    #[must_use]
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
            posts: Mutex::new(HashMap::new()),
            blog_list: Mutex::new(None),
            navigation: Mutex::new(None),
            max_age,
        }
    }

    /// Fetch a cached document, validating freshness against the current
    /// on-disk mtime supplied by `probe`.
    ///
    /// A hit requires the current mtime to be at or before the recorded
    /// one; filesystems with coarse timestamps can report an unchanged
    /// mtime for a same-instant rewrite, which the watcher path corrects.
    /// A failed probe (file gone) evicts the entry.
    pub fn get_doc(
        &self,
        key: &str,
        probe: impl FnOnce(&Path) -> Option<SystemTime>,
    ) -> Option<Document> {
        let mut docs = self.docs.lock().unwrap();
        let entry = docs.get(key)?;
        match probe(&entry.value.path) {
            Some(current) if current <= entry.mtime => Some(entry.value.clone()),
            _ => {
                docs.remove(key);
                None
            }
        }
    }

    /// Store a parsed document under `key` with its parse-time mtime.
    pub fn put_doc(&self, key: &str, doc: Document, mtime: SystemTime) {
        self.docs
            .lock()
            .unwrap()
            .insert(key.to_owned(), MtimeEntry { value: doc, mtime });
    }

    /// Fetch a cached blog post, with the same freshness rule as
    /// [`ContentCache::get_doc`].
    pub fn get_post(
        &self,
        key: &str,
        probe: impl FnOnce(&Path) -> Option<SystemTime>,
    ) -> Option<BlogPost> {
        let mut posts = self.posts.lock().unwrap();
        let entry = posts.get(key)?;
        match probe(&entry.value.path) {
            Some(current) if current <= entry.mtime => Some(entry.value.clone()),
            _ => {
                posts.remove(key);
                None
            }
        }
    }

    /// Store a parsed blog post under `key` with its parse-time mtime.
    pub fn put_post(&self, key: &str, post: BlogPost, mtime: SystemTime) {
        self.posts
            .lock()
            .unwrap()
            .insert(key.to_owned(), MtimeEntry { value: post, mtime });
    }

    /// Fetch the cached blog listing while it is within the validity window.
    #[must_use]
    pub fn get_blog_list(&self) -> Option<Vec<BlogPost>> {
        let mut slot = self.blog_list.lock().unwrap();
        match slot.as_ref() {
            Some(entry) if entry.stored_at.elapsed() < self.max_age => Some(entry.value.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    /// Store the blog listing.
    pub fn put_blog_list(&self, posts: Vec<BlogPost>) {
        *self.blog_list.lock().unwrap() = Some(TimedEntry {
            value: posts,
            stored_at: Instant::now(),
        });
    }

    /// Fetch the cached navigation tree while it is within the validity window.
    #[must_use]
    pub fn get_navigation(&self) -> Option<Vec<NavItem>> {
        let mut slot = self.navigation.lock().unwrap();
        match slot.as_ref() {
            Some(entry) if entry.stored_at.elapsed() < self.max_age => Some(entry.value.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    /// Store the navigation tree.
    pub fn put_navigation(&self, items: Vec<NavItem>) {
        *self.navigation.lock().unwrap() = Some(TimedEntry {
            value: items,
            stored_at: Instant::now(),
        });
    }

    /// Drop the cached entry for one document slug.
    pub fn invalidate_doc(&self, key: &str) {
        self.docs.lock().unwrap().remove(key);
    }

    /// Drop the cached entry for one blog post slug.
    pub fn invalidate_post(&self, key: &str) {
        self.posts.lock().unwrap().remove(key);
    }

    /// Drop the cached navigation tree.
    pub fn clear_navigation(&self) {
        *self.navigation.lock().unwrap() = None;
    }

    /// Drop the cached blog listing.
    pub fn clear_blog_list(&self) {
        *self.blog_list.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dox_content::DocMeta;
    use std::path::PathBuf;

    static_assertions::assert_impl_all!(ContentCache: Send, Sync);

    fn sample_doc(slug: &str) -> Document {
        Document {
            slug: slug.to_owned(),
            meta: DocMeta {
                title: "Sample".to_owned(),
                ..DocMeta::default()
            },
            content: "body".to_owned(),
            path: PathBuf::from(format!("{slug}.md")),
            version: None,
        }
    }

    #[test]
    fn test_doc_hit_when_mtime_unchanged() {
        let cache = ContentCache::new();
        let mtime = SystemTime::now();
        cache.put_doc("guide", sample_doc("guide"), mtime);

        let hit = cache.get_doc("guide", |_| Some(mtime));
        assert_eq!(hit.unwrap().slug, "guide");
    }

    #[test]
    fn test_doc_hit_when_disk_older_than_recorded() {
        let cache = ContentCache::new();
        let recorded = SystemTime::now();
        let older = recorded - Duration::from_secs(10);
        cache.put_doc("guide", sample_doc("guide"), recorded);

        assert!(cache.get_doc("guide", |_| Some(older)).is_some());
    }

    #[test]
    fn test_doc_miss_when_disk_newer_evicts() {
        let cache = ContentCache::new();
        let recorded = SystemTime::now();
        let newer = recorded + Duration::from_secs(10);
        cache.put_doc("guide", sample_doc("guide"), recorded);

        assert!(cache.get_doc("guide", |_| Some(newer)).is_none());
        // Entry was evicted, an unchanged probe no longer hits.
        assert!(cache.get_doc("guide", |_| Some(recorded)).is_none());
    }

    #[test]
    fn test_doc_miss_when_probe_fails_evicts() {
        let cache = ContentCache::new();
        cache.put_doc("guide", sample_doc("guide"), SystemTime::now());

        assert!(cache.get_doc("guide", |_| None).is_none());
        assert!(cache.get_doc("guide", |_| Some(SystemTime::now())).is_none());
    }

    #[test]
    fn test_invalidate_doc_removes_entry() {
        let cache = ContentCache::new();
        let mtime = SystemTime::now();
        cache.put_doc("guide", sample_doc("guide"), mtime);

        cache.invalidate_doc("guide");
        assert!(cache.get_doc("guide", |_| Some(mtime)).is_none());
    }

    #[test]
    fn test_navigation_expires_after_max_age() {
        let cache = ContentCache::with_max_age(Duration::from_millis(0));
        cache.put_navigation(Vec::new());

        assert!(cache.get_navigation().is_none());
    }

    #[test]
    fn test_navigation_valid_within_window() {
        let cache = ContentCache::new();
        cache.put_navigation(vec![NavItem {
            title: "Guide".to_owned(),
            href: "/docs/guide".to_owned(),
            order: Some(1),
            collapsed: None,
            children: Vec::new(),
        }]);

        let nav = cache.get_navigation().unwrap();
        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].href, "/docs/guide");
    }

    #[test]
    fn test_clear_navigation() {
        let cache = ContentCache::new();
        cache.put_navigation(Vec::new());
        cache.clear_navigation();
        assert!(cache.get_navigation().is_none());
    }

    #[test]
    fn test_blog_list_clears_independently_of_posts() {
        let cache = ContentCache::new();
        cache.put_blog_list(Vec::new());
        assert!(cache.get_blog_list().is_some());

        cache.clear_blog_list();
        assert!(cache.get_blog_list().is_none());
    }
}
