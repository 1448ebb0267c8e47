//! Content indexing for dox.
//!
//! Walks content directory trees of Markdown/MDX files, splits YAML front
//! matter from document bodies, and exposes typed [`Document`] and
//! [`BlogPost`] records plus `_category.json` sidecar metadata.
//!
//! Failures while reading individual files are recoverable: enumeration
//! skips unreadable entries with a warning and slug resolution reports
//! missing or unparsable files as absent.

mod category;
mod dir;
mod front_matter;
mod model;

pub use category::load_categories;
pub use dir::{ContentDir, EXTENSIONS, resolution_rank, title_from_filename};
pub use front_matter::split_front_matter;
pub use model::{BlogPost, CategoryConfig, DocMeta, Document, PostMeta};

use std::path::PathBuf;

/// Content reading/parsing error.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Failed to read a content file.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// Path of the file that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Front matter block did not parse as YAML.
    #[error("Invalid front matter in {}: {message}", .path.display())]
    FrontMatter {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}
