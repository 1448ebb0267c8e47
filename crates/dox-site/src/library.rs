//! The content library facade.
//!
//! [`DocLibrary`] is the read API the server and CLI consume: document
//! listings and lookups, the navigation tree, and the blog surface. All
//! failure modes degrade (empty listings, `None` lookups) with a warning
//! rather than propagating.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use dox_config::{BlogConfig, Config, DocsConfig, VersionsConfig};
use dox_content::{BlogPost, ContentDir, Document, load_categories, resolution_rank};

use crate::cache::ContentCache;
use crate::nav::{NavItem, PrevNext, build_navigation, prev_next};

/// Facade over one site's content: docs, versions, navigation, and blog.
///
/// In development mode every read re-parses from disk and draft posts
/// become visible; outside it, reads go through the shared cache.
pub struct DocLibrary {
    docs: DocsConfig,
    blog: BlogConfig,
    versions: VersionsConfig,
    cache: Arc<ContentCache>,
    dev: bool,
}

impl DocLibrary {
    /// Create a library from resolved configuration sections.
    #[must_use]
    pub fn new(
        docs: DocsConfig,
        blog: BlogConfig,
        versions: VersionsConfig,
        cache: Arc<ContentCache>,
        dev: bool,
    ) -> Self {
        Self {
            docs,
            blog,
            versions,
            cache,
            dev,
        }
    }

    /// Create a library from a loaded [`Config`].
    #[must_use]
    pub fn from_config(config: &Config, cache: Arc<ContentCache>) -> Self {
        Self::new(
            config.docs_resolved.clone(),
            config.blog_resolved.clone(),
            config.versions_resolved.clone(),
            cache,
            config.dev,
        )
    }

    /// Root directory of the default docs tree.
    #[must_use]
    pub fn docs_root(&self) -> &std::path::Path {
        &self.docs.dir
    }

    /// Root directory of the blog tree, when the blog is enabled.
    #[must_use]
    pub fn blog_root(&self) -> Option<&std::path::Path> {
        self.blog.enabled.then_some(self.blog.dir.as_path())
    }

    /// URL prefix for doc links.
    #[must_use]
    pub fn docs_base_url(&self) -> &str {
        &self.docs.base_url
    }

    fn docs_dir(&self) -> ContentDir {
        ContentDir::new(self.docs.dir.clone())
    }

    fn blog_dir(&self) -> ContentDir {
        ContentDir::new(self.blog.dir.clone())
    }

    /// All documents of the default docs tree.
    ///
    /// Unparsable files are skipped with a warning. With `auto_sort`
    /// enabled the result is stably sorted by front-matter order;
    /// otherwise it keeps walk order.
    #[must_use]
    pub fn all_docs(&self) -> Vec<Document> {
        self.collect_docs(&self.docs_dir(), None)
    }

    /// All documents of a named docs version. Unknown versions yield an
    /// empty list.
    #[must_use]
    pub fn all_docs_for_version(&self, version: &str) -> Vec<Document> {
        match self.versions.get(version) {
            Some(entry) => {
                self.collect_docs(&ContentDir::new(entry.dir.clone()), Some(version))
            }
            None => Vec::new(),
        }
    }

    fn collect_docs(&self, dir: &ContentDir, version: Option<&str>) -> Vec<Document> {
        let mut docs: Vec<Document> = Vec::new();
        let mut by_slug: HashMap<String, usize> = HashMap::new();
        for rel_path in dir.list_files() {
            match dir.parse_document(&rel_path) {
                Ok(mut doc) => {
                    doc.version = version.map(str::to_owned);
                    match by_slug.entry(doc.slug.clone()) {
                        // A direct file and a directory index can share one
                        // slug; resolution precedence picks the survivor.
                        Entry::Occupied(slot) => {
                            let idx = *slot.get();
                            if resolution_rank(&doc.path) < resolution_rank(&docs[idx].path) {
                                docs[idx] = doc;
                            }
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(docs.len());
                            docs.push(doc);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %rel_path.display(),
                        error = %e,
                        "Skipping unparsable document"
                    );
                }
            }
        }
        if self.docs.auto_sort {
            docs.sort_by_key(|d| d.meta.order.unwrap_or(0));
        }
        docs
    }

    /// Look up a document by slug. `None` for unknown slugs and for
    /// files that fail to read or parse.
    #[must_use]
    pub fn doc_by_slug(&self, slug: &str) -> Option<Document> {
        self.doc_lookup(&self.docs_dir(), slug, None)
    }

    /// Look up a document by slug within a named version.
    #[must_use]
    pub fn doc_by_slug_for_version(&self, version: &str, slug: &str) -> Option<Document> {
        let entry = self.versions.get(version)?;
        self.doc_lookup(&ContentDir::new(entry.dir.clone()), slug, Some(version))
    }

    fn doc_lookup(&self, dir: &ContentDir, slug: &str, version: Option<&str>) -> Option<Document> {
        let key = match version {
            Some(v) => format!("{v}:{slug}"),
            None => slug.to_owned(),
        };

        if !self.dev
            && let Some(doc) = self.cache.get_doc(&key, |path| dir.mtime(path))
        {
            return Some(doc);
        }

        // A candidate that fails to read or parse is treated as absent,
        // falling through to the next one in priority order.
        for rel_path in dir.resolve_candidates(slug) {
            let mut doc = match dir.parse_document(&rel_path) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(
                        slug,
                        path = %rel_path.display(),
                        error = %e,
                        "Skipping unloadable candidate"
                    );
                    continue;
                }
            };
            doc.version = version.map(str::to_owned);

            if !self.dev
                && let Some(mtime) = dir.mtime(&rel_path)
            {
                self.cache.put_doc(&key, doc.clone(), mtime);
            }

            return Some(doc);
        }
        None
    }

    /// The navigation tree of the default docs tree.
    #[must_use]
    pub fn navigation(&self) -> Vec<NavItem> {
        if !self.dev
            && let Some(nav) = self.cache.get_navigation()
        {
            return nav;
        }

        let dir = self.docs_dir();
        let docs = self.collect_docs(&dir, None);
        let categories = load_categories(dir.root());
        let nav = build_navigation(&docs, &categories, &self.docs.base_url);

        if !self.dev {
            self.cache.put_navigation(nav.clone());
        }
        nav
    }

    /// The navigation tree of a named docs version. Unknown versions
    /// yield an empty tree.
    ///
    /// Versioned trees are rebuilt per call; the cached slot holds only
    /// the default tree.
    #[must_use]
    pub fn navigation_for_version(&self, version: &str) -> Vec<NavItem> {
        let Some(entry) = self.versions.get(version) else {
            return Vec::new();
        };
        let dir = ContentDir::new(entry.dir.clone());
        let docs = self.collect_docs(&dir, Some(version));
        let categories = load_categories(dir.root());
        build_navigation(&docs, &categories, &self.docs.base_url)
    }

    /// Previous and next pages around a slug in reading order.
    #[must_use]
    pub fn prev_next(&self, slug: &str) -> PrevNext {
        let nav = self.navigation();
        let href = format!("{}/{slug}", self.docs.base_url);
        prev_next(&href, &nav)
    }

    /// Previous and next pages around a slug within a named version's
    /// reading order.
    #[must_use]
    pub fn prev_next_for_version(&self, version: &str, slug: &str) -> PrevNext {
        let nav = self.navigation_for_version(version);
        let href = format!("{}/{slug}", self.docs.base_url);
        prev_next(&href, &nav)
    }

    /// All blog posts, newest first with featured posts ahead of their
    /// date peers. Drafts appear only in development mode. Empty when
    /// the blog is disabled.
    #[must_use]
    pub fn all_posts(&self) -> Vec<BlogPost> {
        if !self.blog.enabled {
            return Vec::new();
        }
        if !self.dev
            && let Some(list) = self.cache.get_blog_list()
        {
            return list;
        }

        let dir = self.blog_dir();
        let mut posts = Vec::new();
        for rel_path in dir.list_files() {
            match dir.parse_post(&rel_path) {
                Ok(post) => {
                    if post.meta.draft && !self.dev {
                        continue;
                    }
                    posts.push(post);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %rel_path.display(),
                        error = %e,
                        "Skipping unparsable blog post"
                    );
                }
            }
        }

        posts.sort_by(|a, b| {
            b.meta
                .featured
                .cmp(&a.meta.featured)
                .then_with(|| b.meta.date.cmp(&a.meta.date))
                .then_with(|| a.slug.cmp(&b.slug))
        });

        if !self.dev {
            self.cache.put_blog_list(posts.clone());
        }
        posts
    }

    /// Look up a blog post by slug. Drafts resolve only in development
    /// mode, matching their visibility in listings.
    #[must_use]
    pub fn post_by_slug(&self, slug: &str) -> Option<BlogPost> {
        if !self.blog.enabled {
            return None;
        }
        let dir = self.blog_dir();

        if !self.dev
            && let Some(post) = self.cache.get_post(slug, |path| dir.mtime(path))
        {
            return Some(post);
        }

        for rel_path in dir.resolve_candidates(slug) {
            let post = match dir.parse_post(&rel_path) {
                Ok(post) => post,
                Err(e) => {
                    tracing::warn!(
                        slug,
                        path = %rel_path.display(),
                        error = %e,
                        "Skipping unloadable candidate"
                    );
                    continue;
                }
            };
            if post.meta.draft && !self.dev {
                return None;
            }

            if !self.dev
                && let Some(mtime) = dir.mtime(&rel_path)
            {
                self.cache.put_post(slug, post.clone(), mtime);
            }

            return Some(post);
        }
        None
    }

    /// Blog posts carrying a tag, in listing order.
    #[must_use]
    pub fn posts_by_tag(&self, tag: &str) -> Vec<BlogPost> {
        self.all_posts()
            .into_iter()
            .filter(|p| p.meta.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// All tags across visible posts, sorted and deduplicated.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .all_posts()
            .into_iter()
            .flat_map(|p| p.meta.tags)
            .collect();
        set.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dox_config::VersionEntry;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::{Path, PathBuf};

    struct Fixture {
        _temp: tempfile::TempDir,
        docs: DocsConfig,
        blog: BlogConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = tempfile::tempdir().unwrap();
            let docs_dir = temp.path().join("docs");
            let blog_dir = temp.path().join("blog");
            fs::create_dir_all(&docs_dir).unwrap();
            fs::create_dir_all(&blog_dir).unwrap();
            Self {
                docs: DocsConfig {
                    dir: docs_dir,
                    base_url: "/docs".to_owned(),
                    auto_sort: true,
                },
                blog: BlogConfig {
                    enabled: true,
                    dir: blog_dir,
                    base_url: "/blog".to_owned(),
                },
                _temp: temp,
            }
        }

        fn write_doc(&self, rel: &str, content: &str) {
            let path = self.docs.dir.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn write_blog(&self, rel: &str, content: &str) {
            let path = self.blog.dir.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn library(&self, dev: bool) -> DocLibrary {
            DocLibrary::new(
                self.docs.clone(),
                self.blog.clone(),
                VersionsConfig::default(),
                Arc::new(ContentCache::new()),
                dev,
            )
        }
    }

    #[test]
    fn test_all_docs_sorted_by_order() {
        let fx = Fixture::new();
        fx.write_doc("b.md", "---\ntitle: B\norder: 1\n---\nBody");
        fx.write_doc("a.md", "---\ntitle: A\norder: 2\n---\nBody");

        let lib = fx.library(false);
        let docs = lib.all_docs();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].meta.title, "B");
        assert_eq!(docs[1].meta.title, "A");
    }

    #[test]
    fn test_all_docs_skips_broken_files() {
        let fx = Fixture::new();
        fx.write_doc("good.md", "---\ntitle: Good\n---\nBody");
        fx.write_doc("bad.md", "---\ntitle: [broken\n---\nBody");

        let lib = fx.library(false);
        let docs = lib.all_docs();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].meta.title, "Good");
    }

    #[test]
    fn test_doc_by_slug_found_and_missing() {
        let fx = Fixture::new();
        fx.write_doc("guide.md", "---\ntitle: Guide\n---\nBody");

        let lib = fx.library(false);
        assert_eq!(lib.doc_by_slug("guide").unwrap().meta.title, "Guide");
        assert!(lib.doc_by_slug("missing").is_none());
    }

    #[test]
    fn test_doc_by_slug_serves_cached_copy_until_file_changes() {
        let fx = Fixture::new();
        fx.write_doc("guide.md", "---\ntitle: First\n---\nBody");

        let lib = fx.library(false);
        assert_eq!(lib.doc_by_slug("guide").unwrap().meta.title, "First");

        // Make the rewrite strictly newer than the recorded mtime.
        std::thread::sleep(std::time::Duration::from_millis(20));
        fx.write_doc("guide.md", "---\ntitle: Second\n---\nBody");

        assert_eq!(lib.doc_by_slug("guide").unwrap().meta.title, "Second");
    }

    #[test]
    fn test_doc_by_slug_dev_mode_always_reparses() {
        let fx = Fixture::new();
        fx.write_doc("guide.md", "---\ntitle: First\n---\nBody");

        let lib = fx.library(true);
        assert_eq!(lib.doc_by_slug("guide").unwrap().meta.title, "First");

        fx.write_doc("guide.md", "---\ntitle: Second\n---\nBody");
        assert_eq!(lib.doc_by_slug("guide").unwrap().meta.title, "Second");
    }

    #[test]
    fn test_doc_removed_on_disk_stops_resolving() {
        let fx = Fixture::new();
        fx.write_doc("guide.md", "---\ntitle: Guide\n---\nBody");

        let lib = fx.library(false);
        assert!(lib.doc_by_slug("guide").is_some());

        fs::remove_file(fx.docs.dir.join("guide.md")).unwrap();
        assert!(lib.doc_by_slug("guide").is_none());
    }

    #[test]
    fn test_versioned_docs() {
        let fx = Fixture::new();
        let v1_dir = fx._temp.path().join("versioned").join("v1");
        fs::create_dir_all(&v1_dir).unwrap();
        fs::write(v1_dir.join("old.md"), "---\ntitle: Old Guide\n---\nBody").unwrap();

        let lib = DocLibrary::new(
            fx.docs.clone(),
            fx.blog.clone(),
            VersionsConfig {
                enabled: true,
                versions: vec![VersionEntry {
                    name: "v1".to_owned(),
                    dir: v1_dir,
                    is_default: false,
                }],
            },
            Arc::new(ContentCache::new()),
            false,
        );

        let docs = lib.all_docs_for_version("v1");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].version.as_deref(), Some("v1"));

        let doc = lib.doc_by_slug_for_version("v1", "old").unwrap();
        assert_eq!(doc.meta.title, "Old Guide");
        assert!(lib.doc_by_slug_for_version("v2", "old").is_none());
        assert!(lib.all_docs_for_version("v2").is_empty());
    }

    #[test]
    fn test_versioned_prev_next_uses_version_tree() {
        let fx = Fixture::new();
        let v1_dir = fx._temp.path().join("versioned").join("v1");
        fs::create_dir_all(&v1_dir).unwrap();
        fs::write(v1_dir.join("one.md"), "---\ntitle: One\norder: 1\n---\nBody").unwrap();
        fs::write(v1_dir.join("two.md"), "---\ntitle: Two\norder: 2\n---\nBody").unwrap();

        let lib = DocLibrary::new(
            fx.docs.clone(),
            fx.blog.clone(),
            VersionsConfig {
                enabled: true,
                versions: vec![VersionEntry {
                    name: "v1".to_owned(),
                    dir: v1_dir,
                    is_default: false,
                }],
            },
            Arc::new(ContentCache::new()),
            false,
        );

        let around = lib.prev_next_for_version("v1", "two");
        assert_eq!(around.prev.unwrap().href, "/docs/one");
        assert!(around.next.is_none());

        // The default tree is empty, so default-tree neighbours stay empty.
        assert_eq!(lib.prev_next("two"), PrevNext::default());
        assert!(lib.navigation_for_version("v2").is_empty());
    }

    #[test]
    fn test_navigation_end_to_end_with_category_sidecar() {
        let fx = Fixture::new();
        fx.write_doc("intro.md", "---\ntitle: Intro\norder: 1\n---\nBody");
        fx.write_doc(
            "guides/setup.md",
            "---\ntitle: Setup\norder: 1\n---\nBody",
        );
        fx.write_doc(
            "guides/deploy.md",
            "---\ntitle: Deploy\norder: 2\n---\nBody",
        );
        fx.write_doc(
            "guides/_category.json",
            r#"{"name": "Guides", "order": 2, "collapsed": true}"#,
        );

        let lib = fx.library(false);
        let nav = lib.navigation();

        assert_eq!(nav.len(), 2);
        assert_eq!(nav[0].title, "Intro");
        assert_eq!(nav[0].href, "/docs/intro");
        let guides = &nav[1];
        assert_eq!(guides.title, "Guides");
        assert_eq!(guides.href, "#");
        assert_eq!(guides.collapsed, Some(true));
        let children: Vec<_> = guides.children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(children, vec!["Setup", "Deploy"]);
    }

    #[test]
    fn test_prev_next_through_library() {
        let fx = Fixture::new();
        fx.write_doc("one.md", "---\ntitle: One\norder: 1\n---\nBody");
        fx.write_doc("two.md", "---\ntitle: Two\norder: 2\n---\nBody");

        let lib = fx.library(false);
        let around = lib.prev_next("two");

        assert_eq!(around.prev.unwrap().href, "/docs/one");
        assert!(around.next.is_none());
    }

    #[test]
    fn test_navigation_unordered_doc_after_ordered_category() {
        let fx = Fixture::new();
        fx.write_doc(
            "guide/intro.mdx",
            "---\ntitle: Introduction\norder: 1\n---\nBody",
        );
        fx.write_doc("guide/_category.json", r#"{"name": "Guide", "order": 1}"#);
        fx.write_doc("faq.mdx", "---\ntitle: FAQ\n---\nBody");

        let lib = fx.library(false);
        let nav = lib.navigation();

        let titles: Vec<_> = nav.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Guide", "FAQ"]);
    }

    #[test]
    fn test_doc_by_slug_falls_back_past_unparsable_candidate() {
        let fx = Fixture::new();
        fx.write_doc("guide.mdx", "---\ntitle: [broken\n---\nBody");
        fx.write_doc("guide/index.mdx", "---\ntitle: Guide Index\n---\nBody");

        let lib = fx.library(false);
        let doc = lib.doc_by_slug("guide").unwrap();

        assert_eq!(doc.meta.title, "Guide Index");
        assert_eq!(doc.path, PathBuf::from("guide/index.mdx"));
    }

    #[test]
    fn test_post_by_slug_falls_back_past_unparsable_candidate() {
        let fx = Fixture::new();
        fx.write_blog("launch.mdx", "---\ntitle: [broken\n---\nBody");
        fx.write_blog(
            "launch/index.md",
            "---\ntitle: Launch\ndate: 2024-06-01\n---\nBody",
        );

        let lib = fx.library(false);
        let post = lib.post_by_slug("launch").unwrap();
        assert_eq!(post.meta.title, "Launch");
    }

    #[test]
    fn test_all_docs_slugs_unique_direct_file_wins() {
        let fx = Fixture::new();
        fx.write_doc("a/index.mdx", "---\ntitle: Index Page\n---\nBody");
        fx.write_doc("a.mdx", "---\ntitle: Direct Page\n---\nBody");

        let lib = fx.library(false);
        let docs = lib.all_docs();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].slug, "a");
        assert_eq!(docs[0].meta.title, "Direct Page");
    }

    #[test]
    fn test_all_posts_sorted_newest_first_featured_leading() {
        let fx = Fixture::new();
        fx.write_blog("old.md", "---\ntitle: Old\ndate: 2024-01-01\n---\nBody");
        fx.write_blog("new.md", "---\ntitle: New\ndate: 2024-06-01\n---\nBody");
        fx.write_blog(
            "pinned.md",
            "---\ntitle: Pinned\ndate: 2024-02-01\nfeatured: true\n---\nBody",
        );

        let lib = fx.library(false);
        let posts = lib.all_posts();

        let titles: Vec<_> = posts.iter().map(|p| p.meta.title.as_str()).collect();
        assert_eq!(titles, vec!["Pinned", "New", "Old"]);
    }

    #[test]
    fn test_drafts_hidden_outside_dev_mode() {
        let fx = Fixture::new();
        fx.write_blog(
            "wip.md",
            "---\ntitle: WIP\ndate: 2024-05-01\ndraft: true\n---\nBody",
        );
        fx.write_blog("live.md", "---\ntitle: Live\ndate: 2024-04-01\n---\nBody");

        let lib = fx.library(false);
        assert_eq!(lib.all_posts().len(), 1);
        assert!(lib.post_by_slug("wip").is_none());
        assert!(lib.post_by_slug("live").is_some());

        let dev_lib = fx.library(true);
        assert_eq!(dev_lib.all_posts().len(), 2);
        assert!(dev_lib.post_by_slug("wip").is_some());
    }

    #[test]
    fn test_blog_disabled_yields_nothing() {
        let fx = Fixture::new();
        fx.write_blog("post.md", "---\ntitle: Post\ndate: 2024-01-01\n---\nBody");

        let mut blog = fx.blog.clone();
        blog.enabled = false;
        let lib = DocLibrary::new(
            fx.docs.clone(),
            blog,
            VersionsConfig::default(),
            Arc::new(ContentCache::new()),
            false,
        );

        assert!(lib.all_posts().is_empty());
        assert!(lib.post_by_slug("post").is_none());
    }

    #[test]
    fn test_posts_by_tag_and_tags() {
        let fx = Fixture::new();
        fx.write_blog(
            "a.md",
            "---\ntitle: A\ndate: 2024-01-01\ntags: [rust, web]\n---\nBody",
        );
        fx.write_blog(
            "b.md",
            "---\ntitle: B\ndate: 2024-02-01\ntags: [rust]\n---\nBody",
        );

        let lib = fx.library(false);
        assert_eq!(lib.posts_by_tag("rust").len(), 2);
        assert_eq!(lib.posts_by_tag("web").len(), 1);
        assert!(lib.posts_by_tag("nope").is_empty());
        assert_eq!(lib.tags(), vec!["rust".to_owned(), "web".to_owned()]);
    }

    #[test]
    fn test_blog_root_reflects_enabled_flag() {
        let fx = Fixture::new();
        let lib = fx.library(false);
        assert_eq!(lib.blog_root(), Some(fx.blog.dir.as_path()));

        let mut blog = fx.blog.clone();
        blog.enabled = false;
        let lib = DocLibrary::new(
            fx.docs.clone(),
            blog,
            VersionsConfig::default(),
            Arc::new(ContentCache::new()),
            false,
        );
        assert_eq!(lib.blog_root(), None);
    }

    #[test]
    fn test_docs_root_and_base_url() {
        let fx = Fixture::new();
        let lib = fx.library(false);
        assert_eq!(lib.docs_root(), fx.docs.dir.as_path());
        assert_eq!(lib.docs_base_url(), "/docs");
        assert!(lib.docs_root().ends_with(Path::new("docs")));
    }
}
