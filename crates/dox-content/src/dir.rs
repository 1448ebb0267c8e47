//! Content directory indexing.
//!
//! [`ContentDir`] wraps one content root (a docs tree, a blog tree, or a
//! versioned docs tree) and provides enumeration, slug resolution, and
//! parsing into typed records.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::front_matter::{parse_matter, split_front_matter};
use crate::model::{BlogPost, DocMeta, Document, PostMeta, make_excerpt};
use crate::ContentError;

/// Recognized content file extensions, in resolution priority order.
pub const EXTENSIONS: [&str; 2] = ["mdx", "md"];

/// One content root on disk.
#[derive(Debug, Clone)]
pub struct ContentDir {
    root: PathBuf,
}

impl ContentDir {
    /// Create a content directory wrapper. The root may not exist yet;
    /// enumeration of a missing root yields no files.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory on disk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerate all content files under the root, as relative paths.
    ///
    /// Hidden and underscore-prefixed entries are skipped, as are common
    /// non-content directories. Unreadable subdirectories are skipped with
    /// a warning, keeping the rest of the result.
    #[must_use]
    pub fn list_files(&self) -> Vec<PathBuf> {
        if !self.root.exists() {
            return Vec::new();
        }
        self.scan_directory(&self.root, Path::new(""))
    }

    /// Scan directory recursively and collect content file paths.
    fn scan_directory(&self, dir_path: &Path, base_path: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir_path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    path = %dir_path.display(),
                    error = %e,
                    "Skipping unreadable directory"
                );
                return Vec::new();
            }
        };

        let mut files = Vec::new();

        // Collect entries with cached file_type to avoid repeated stat calls in sort.
        let mut entries: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| {
                let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
                let name_lower = e.file_name().to_string_lossy().to_lowercase();
                (e, is_dir, name_lower)
            })
            .collect();

        // Sort: directories first, then alphabetical by name
        entries.sort_by(|(_, a_is_dir, a_name), (_, b_is_dir, b_name)| {
            b_is_dir.cmp(a_is_dir).then_with(|| a_name.cmp(b_name))
        });

        for (entry, is_dir, name_lower) in entries {
            // Skip hidden and underscore-prefixed files/dirs
            if name_lower.starts_with('.') || name_lower.starts_with('_') {
                continue;
            }

            // Skip common non-content directories
            if is_dir
                && matches!(
                    name_lower.as_str(),
                    "node_modules" | "target" | "dist" | "build" | "vendor" | "__pycache__"
                )
            {
                continue;
            }

            let rel_path = base_path.join(entry.file_name());

            if is_dir {
                files.extend(self.scan_directory(&entry.path(), &rel_path));
            } else if has_content_extension(&rel_path) {
                files.push(rel_path);
            }
        }

        files
    }

    /// Resolve a slug to the existing content files that could back it,
    /// in priority order: `{slug}.mdx`, `{slug}.md`, `{slug}/index.mdx`,
    /// `{slug}/index.md`.
    ///
    /// Callers parse candidates in order and fall through on failure, so
    /// an unreadable or malformed high-priority file does not shadow a
    /// valid lower-priority one.
    #[must_use]
    pub fn resolve_candidates(&self, slug: &str) -> Vec<PathBuf> {
        if slug.is_empty() || slug.split('/').any(|seg| seg == "..") {
            return Vec::new();
        }
        slug_candidates(slug)
            .into_iter()
            .filter(|candidate| self.root.join(candidate).is_file())
            .collect()
    }

    /// Parse one documentation page from a relative path.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Io` when the file cannot be read and
    /// `ContentError::FrontMatter` when its metadata block is malformed.
    pub fn parse_document(&self, rel_path: &Path) -> Result<Document, ContentError> {
        let full_path = self.root.join(rel_path);
        let raw = fs::read_to_string(&full_path).map_err(|source| ContentError::Io {
            path: full_path.clone(),
            source,
        })?;

        let split = split_front_matter(&raw);
        let mut meta: DocMeta =
            parse_matter(split.matter).map_err(|message| ContentError::FrontMatter {
                path: full_path,
                message,
            })?;

        if meta.title.is_empty() {
            meta.title = title_from_filename(&file_stem_lower(rel_path));
        }

        Ok(Document {
            slug: slug_from_path(rel_path),
            meta,
            content: split.body.to_owned(),
            path: rel_path.to_path_buf(),
            version: None,
        })
    }

    /// Parse one blog post from a relative path.
    ///
    /// Posts must carry front matter with a parsable `date`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Io` when the file cannot be read and
    /// `ContentError::FrontMatter` when metadata is missing or malformed.
    pub fn parse_post(&self, rel_path: &Path) -> Result<BlogPost, ContentError> {
        let full_path = self.root.join(rel_path);
        let raw = fs::read_to_string(&full_path).map_err(|source| ContentError::Io {
            path: full_path.clone(),
            source,
        })?;

        let split = split_front_matter(&raw);
        let matter = split.matter.ok_or_else(|| ContentError::FrontMatter {
            path: full_path.clone(),
            message: "missing front matter".to_owned(),
        })?;
        let mut meta: PostMeta =
            serde_yaml::from_str(matter).map_err(|e| ContentError::FrontMatter {
                path: full_path,
                message: e.to_string(),
            })?;

        if meta.title.is_empty() {
            meta.title = title_from_filename(&file_stem_lower(rel_path));
        }

        Ok(BlogPost {
            slug: slug_from_path(rel_path),
            meta,
            excerpt: make_excerpt(split.body),
            content: split.body.to_owned(),
            path: rel_path.to_path_buf(),
        })
    }

    /// Current modification time of a relative path, when the file exists.
    #[must_use]
    pub fn mtime(&self, rel_path: &Path) -> Option<SystemTime> {
        fs::metadata(self.root.join(rel_path))
            .ok()
            .and_then(|m| m.modified().ok())
    }
}

/// Whether a path carries a recognized content extension.
fn has_content_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

/// Candidate relative paths for a slug, in priority order.
fn slug_candidates(slug: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(EXTENSIONS.len() * 2);
    for ext in EXTENSIONS {
        candidates.push(PathBuf::from(format!("{slug}.{ext}")));
    }
    for ext in EXTENSIONS {
        candidates.push(PathBuf::from(format!("{slug}/index.{ext}")));
    }
    candidates
}

/// Resolution precedence rank of a content path for its slug; lower wins.
///
/// Direct files rank ahead of directory index files, and extensions rank
/// in [`EXTENSIONS`] order, matching slug candidate priority.
#[must_use]
pub fn resolution_rank(rel_path: &Path) -> usize {
    let ext_rank = rel_path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(|ext| EXTENSIONS.iter().position(|e| *e == ext))
        .unwrap_or(EXTENSIONS.len());
    let is_index = rel_path.file_stem().is_some_and(|s| s == "index")
        && rel_path.parent().is_some_and(|p| !p.as_os_str().is_empty());
    usize::from(is_index) * EXTENSIONS.len() + ext_rank
}

/// Derive a slug from a relative content path.
///
/// The extension is stripped, separators normalize to `/`, and an
/// `index` leaf collapses into its parent directory path.
#[must_use]
pub(crate) fn slug_from_path(rel_path: &Path) -> String {
    let without_ext = rel_path.with_extension("");
    let slug = without_ext
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/");

    match slug.strip_suffix("/index") {
        Some(parent) => parent.to_owned(),
        None => slug,
    }
}

/// Lowercased file stem of a relative path.
fn file_stem_lower(rel_path: &Path) -> String {
    rel_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Generate a display title from a filename stem.
#[must_use]
pub fn title_from_filename(stem: &str) -> String {
    stem.replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
