//! Content record types.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of body characters kept in a blog post excerpt.
const EXCERPT_LEN: usize = 150;

/// Front matter metadata of a documentation page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocMeta {
    /// Page title. Empty when the front matter omits it; the indexer
    /// substitutes a humanized filename before the record is exposed.
    pub title: String,
    /// Optional short description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sidebar ordering weight, lower sorts first. Absent when the front
    /// matter has no `order`; unordered pages sort after ordered ones in
    /// navigation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Optional category label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-form tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Publication date, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Last-updated date, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A parsed documentation page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Slug: relative path with extension stripped, `/`-separated.
    pub slug: String,
    /// Parsed front matter.
    pub meta: DocMeta,
    /// Body with front matter removed. Opaque to the core.
    pub content: String,
    /// Relative source path, used to re-locate the file.
    pub path: PathBuf,
    /// Docs version this page belongs to, when versioning is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Front matter metadata of a blog post.
///
/// Unlike [`DocMeta`], the `date` field is required; a post without a
/// parsable date is a front matter error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMeta {
    /// Post title. Empty when omitted; the indexer substitutes a
    /// humanized filename.
    #[serde(default)]
    pub title: String,
    /// Optional short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Publication date.
    pub date: NaiveDate,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Draft posts are hidden outside development mode.
    #[serde(default)]
    pub draft: bool,
    /// Featured posts sort ahead of their date peers in listings.
    #[serde(default)]
    pub featured: bool,
    /// Optional cover image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A parsed blog post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogPost {
    /// Slug: relative path with extension stripped, `/`-separated.
    pub slug: String,
    /// Parsed front matter.
    pub meta: PostMeta,
    /// Body with front matter removed.
    pub content: String,
    /// Short plain-text preview derived from the body.
    pub excerpt: String,
    /// Relative source path.
    pub path: PathBuf,
}

/// Category metadata from a `_category.json` sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Display name for the category node.
    pub name: String,
    /// Ordering weight, lower sorts first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the category renders collapsed by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

/// Derive a short excerpt from a post body.
///
/// Newlines collapse to spaces; the result is truncated to roughly
/// [`EXCERPT_LEN`] characters with a trailing ellipsis when cut.
#[must_use]
pub(crate) fn make_excerpt(body: &str) -> String {
    let collapsed: String = body
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let trimmed = collapsed.split_whitespace().collect::<Vec<_>>().join(" ");

    if trimmed.chars().count() <= EXCERPT_LEN {
        return trimmed;
    }

    let cut: String = trimmed.chars().take(EXCERPT_LEN).collect();
    format!("{}...", cut.trim_end())
}
