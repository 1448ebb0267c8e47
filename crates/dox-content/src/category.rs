//! `_category.json` sidecar loading.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::model::CategoryConfig;

/// Sidecar filename carrying category metadata for a directory.
const CATEGORY_FILENAME: &str = "_category.json";

/// Load category sidecars for every subdirectory under `root`.
///
/// Keys are directory paths relative to the root, `/`-separated. A
/// malformed or unreadable sidecar is skipped with a warning; the rest of
/// the scan proceeds. A missing root yields an empty map.
#[must_use]
pub fn load_categories(root: &Path) -> HashMap<String, CategoryConfig> {
    let mut categories = HashMap::new();
    if root.exists() {
        collect(root, "", &mut categories);
    }
    categories
}

fn collect(dir: &Path, prefix: &str, out: &mut HashMap<String, CategoryConfig>) {
    // The root itself carries no category node, only subdirectories do.
    if !prefix.is_empty() {
        let sidecar = dir.join(CATEGORY_FILENAME);
        if sidecar.is_file() {
            match read_sidecar(&sidecar) {
                Ok(config) => {
                    out.insert(prefix.to_owned(), config);
                }
                Err(message) => {
                    tracing::warn!(
                        path = %sidecar.display(),
                        error = %message,
                        "Skipping invalid category sidecar"
                    );
                }
            }
        }
    }

    let Ok(entries) = fs::read_dir(dir) else {
        tracing::warn!(path = %dir.display(), "Skipping unreadable directory");
        return;
    };

    for entry in entries.filter_map(Result::ok) {
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        let child_prefix = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        collect(&entry.path(), &child_prefix, out);
    }
}

fn read_sidecar(path: &Path) -> Result<CategoryConfig, String> {
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_load_categories_missing_root() {
        let categories = load_categories(Path::new("/nonexistent"));
        assert!(categories.is_empty());
    }

    #[test]
    fn test_load_categories_nested() {
        let temp = create_test_dir();
        let guides = temp.path().join("guides");
        let advanced = guides.join("advanced");
        fs::create_dir_all(&advanced).unwrap();
        fs::write(
            guides.join("_category.json"),
            r#"{"name": "Guides", "order": 1, "collapsed": false}"#,
        )
        .unwrap();
        fs::write(
            advanced.join("_category.json"),
            r#"{"name": "Advanced Topics", "order": 2}"#,
        )
        .unwrap();

        let categories = load_categories(temp.path());

        assert_eq!(categories.len(), 2);
        assert_eq!(categories["guides"].name, "Guides");
        assert_eq!(categories["guides"].order, Some(1));
        assert_eq!(categories["guides"].collapsed, Some(false));
        assert_eq!(categories["guides/advanced"].name, "Advanced Topics");
    }

    #[test]
    fn test_load_categories_skips_malformed_sidecar() {
        let temp = create_test_dir();
        let good = temp.path().join("good");
        let bad = temp.path().join("bad");
        fs::create_dir_all(&good).unwrap();
        fs::create_dir_all(&bad).unwrap();
        fs::write(good.join("_category.json"), r#"{"name": "Good"}"#).unwrap();
        fs::write(bad.join("_category.json"), "{not json").unwrap();

        let categories = load_categories(temp.path());

        assert_eq!(categories.len(), 1);
        assert_eq!(categories["good"].name, "Good");
    }

    #[test]
    fn test_load_categories_directory_without_sidecar() {
        let temp = create_test_dir();
        fs::create_dir_all(temp.path().join("plain")).unwrap();

        let categories = load_categories(temp.path());
        assert!(categories.is_empty());
    }

    #[test]
    fn test_load_categories_skips_hidden_dirs() {
        let temp = create_test_dir();
        let hidden = temp.path().join(".git");
        fs::create_dir_all(&hidden).unwrap();
        fs::write(hidden.join("_category.json"), r#"{"name": "Nope"}"#).unwrap();

        let categories = load_categories(temp.path());
        assert!(categories.is_empty());
    }
}
