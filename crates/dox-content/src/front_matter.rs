//! Front matter splitting and parsing.
//!
//! A content file may start with a `---` fence pair delimiting a YAML
//! metadata block; everything after the closing fence is the body. Files
//! without an opening fence are all body.

use serde::de::DeserializeOwned;

/// A content file split into its optional front matter and body.
#[derive(Debug, PartialEq, Eq)]
pub struct SplitContent<'a> {
    /// Raw YAML between the fences, without the fence lines.
    pub matter: Option<&'a str>,
    /// Document body with front matter stripped.
    pub body: &'a str,
}

/// Split a content file into front matter and body.
///
/// The opening fence must be the very first line. A missing closing fence
/// means the file has no front matter and the whole input is body.
#[must_use]
pub fn split_front_matter(input: &str) -> SplitContent<'_> {
    let Some(after_open) = input
        .strip_prefix("---\n")
        .or_else(|| input.strip_prefix("---\r\n"))
    else {
        return SplitContent {
            matter: None,
            body: input,
        };
    };

    // Closing fence: a line that is exactly `---`, or `---` ending the file.
    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed == "---" {
            let matter = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return SplitContent {
                matter: Some(matter),
                body,
            };
        }
        offset += line.len();
    }

    SplitContent {
        matter: None,
        body: input,
    }
}

/// Parse a front matter block into a typed metadata struct.
///
/// Empty or whitespace-only matter yields the type's default.
///
/// # Errors
///
/// Returns the serde message when the YAML is malformed or a required
/// field is missing.
pub(crate) fn parse_matter<T>(matter: Option<&str>) -> Result<T, String>
where
    T: DeserializeOwned + Default,
{
    let Some(matter) = matter else {
        return Ok(T::default());
    };
    if matter.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(matter).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocMeta;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_with_front_matter() {
        let input = "---\ntitle: Guide\norder: 2\n---\n# Heading\n\nBody.";
        let split = split_front_matter(input);
        assert_eq!(split.matter, Some("title: Guide\norder: 2\n"));
        assert_eq!(split.body, "# Heading\n\nBody.");
    }

    #[test]
    fn test_split_without_front_matter() {
        let input = "# Heading\n\nBody.";
        let split = split_front_matter(input);
        assert_eq!(split.matter, None);
        assert_eq!(split.body, input);
    }

    #[test]
    fn test_split_fence_not_at_start_is_body() {
        let input = "\n---\ntitle: Guide\n---\nBody.";
        let split = split_front_matter(input);
        assert_eq!(split.matter, None);
        assert_eq!(split.body, input);
    }

    #[test]
    fn test_split_unclosed_fence_is_body() {
        let input = "---\ntitle: Guide\nBody without closing fence.";
        let split = split_front_matter(input);
        assert_eq!(split.matter, None);
        assert_eq!(split.body, input);
    }

    #[test]
    fn test_split_closing_fence_at_eof() {
        let input = "---\ntitle: Guide\n---";
        let split = split_front_matter(input);
        assert_eq!(split.matter, Some("title: Guide\n"));
        assert_eq!(split.body, "");
    }

    #[test]
    fn test_split_crlf_fences() {
        let input = "---\r\ntitle: Guide\r\n---\r\nBody.";
        let split = split_front_matter(input);
        assert_eq!(split.matter, Some("title: Guide\r\n"));
        assert_eq!(split.body, "Body.");
    }

    #[test]
    fn test_split_empty_matter() {
        let input = "---\n---\nBody.";
        let split = split_front_matter(input);
        assert_eq!(split.matter, Some(""));
        assert_eq!(split.body, "Body.");
    }

    #[test]
    fn test_parse_matter_none_yields_default() {
        let meta: DocMeta = parse_matter(None).unwrap();
        assert_eq!(meta, DocMeta::default());
    }

    #[test]
    fn test_parse_matter_empty_yields_default() {
        let meta: DocMeta = parse_matter(Some("   \n")).unwrap();
        assert_eq!(meta, DocMeta::default());
    }

    #[test]
    fn test_parse_matter_invalid_yaml_errors() {
        let result: Result<DocMeta, _> = parse_matter(Some("title: [unclosed"));
        assert!(result.is_err());
    }
}
