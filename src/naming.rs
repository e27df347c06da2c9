//! Filename ↔ slug conventions for content files.
//!
//! Every content item lives in a single file named `<slug>.<ext>`. The slug
//! is the file name with the extension stripped, taken verbatim: no number
//! prefix parsing, no case folding. Two consequences follow:
//!
//! - a slug is stable for as long as the file keeps its name;
//! - mapping a slug back to a path is a plain join, so incoming slugs must be
//!   checked to be a single, harmless path component before the join.
//!
//! ## Display Titles
//!
//! Listings that need a label for an item with no `title` in its front matter
//! still use the `"Untitled"` default from the schema. [`display_title`] is
//! only used by CLI output, where dashes read better as spaces:
//! - `light-studies` → "light studies"

use std::path::{Path, PathBuf};

/// Extract the slug from a content file path if it carries `extension`.
///
/// The extension must match exactly: [`path_for_slug`] joins `extension`
/// verbatim, so `Loud.MDX` would list a slug that can never be loaded.
///
/// - `"blog/hello-world.mdx"`, `"mdx"` → `Some("hello-world")`
/// - `"blog/notes.txt"`, `"mdx"` → `None`
/// - `"blog/.hidden.mdx"`, `"mdx"` → `None`
pub fn slug_from_path(path: &Path, extension: &str) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if ext != extension {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(stem.to_string())
}

/// Whether `slug` can be joined onto a content directory safely.
///
/// Rejects empty slugs, anything containing a path separator, and the
/// `.`/`..` components. Everything else is accepted as-is.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.starts_with('.')
        && !slug.contains(['/', '\\', '\0'])
}

/// Path of the file backing `slug`, or `None` for an unsafe slug.
pub fn path_for_slug(dir: &Path, slug: &str, extension: &str) -> Option<PathBuf> {
    is_valid_slug(slug).then(|| dir.join(format!("{slug}.{extension}")))
}

/// Human label for a slug: dashes become spaces.
pub fn display_title(slug: &str) -> String {
    slug.replace('-', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_extension() {
        let slug = slug_from_path(Path::new("content/blog/hello-world.mdx"), "mdx");
        assert_eq!(slug.as_deref(), Some("hello-world"));
    }

    #[test]
    fn slug_extension_is_case_sensitive() {
        assert_eq!(slug_from_path(Path::new("content/blog/Loud.MDX"), "mdx"), None);
        assert_eq!(slug_from_path(Path::new("content/blog/Loud.mdx"), "mdx").as_deref(), Some("Loud"));
    }

    #[test]
    fn slug_keeps_inner_dots() {
        let slug = slug_from_path(Path::new("v1.2-release.mdx"), "mdx");
        assert_eq!(slug.as_deref(), Some("v1.2-release"));
    }

    #[test]
    fn other_extension_is_not_content() {
        assert_eq!(slug_from_path(Path::new("notes.md"), "mdx"), None);
        assert_eq!(slug_from_path(Path::new("README"), "mdx"), None);
    }

    #[test]
    fn hidden_file_is_not_content() {
        assert_eq!(slug_from_path(Path::new(".draft.mdx"), "mdx"), None);
    }

    #[test]
    fn traversal_slugs_rejected() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug(".."));
        assert!(!is_valid_slug("../secrets"));
        assert!(!is_valid_slug("a/b"));
        assert!(!is_valid_slug("a\\b"));
        assert!(!is_valid_slug(".env"));
    }

    #[test]
    fn ordinary_slugs_accepted() {
        assert!(is_valid_slug("hello-world"));
        assert!(is_valid_slug("2024_retrospective"));
        assert!(is_valid_slug("v1.2-release"));
    }

    #[test]
    fn path_for_slug_joins_extension() {
        let p = path_for_slug(Path::new("/c/blog"), "first", "mdx").unwrap();
        assert_eq!(p, Path::new("/c/blog/first.mdx"));
        assert!(path_for_slug(Path::new("/c/blog"), "../x", "mdx").is_none());
    }

    #[test]
    fn display_title_replaces_dashes() {
        assert_eq!(display_title("light-studies"), "light studies");
    }
}
