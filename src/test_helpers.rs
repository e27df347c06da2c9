//! Shared test utilities.
//!
//! Builds throwaway content directories and repositories over them.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = content_dir();
//! write_post(tmp.path(), "first-light", "2024-03-01", false);
//! let repo = blog_repo(tmp.path());
//! assert_eq!(repo.slugs().unwrap(), vec!["first-light"]);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::compile::MdxCompiler;
use crate::content::{BlogRepository, PortfolioRepository, Repository};
use crate::logging::Logger;

// =========================================================================
// Fixture setup
// =========================================================================

/// An empty temp directory to fill with content files.
pub fn content_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Write `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// A blog post titled after its slug with a short Markdown body.
pub fn write_post(dir: &Path, slug: &str, published_at: &str, is_draft: bool) {
    write_file(
        dir,
        &format!("{slug}.mdx"),
        &format!(
            "---\ntitle: {slug}\npublishedAt: {published_at}\nisDraft: {is_draft}\n---\nBody of *{slug}*.\n"
        ),
    );
}

/// An artwork titled after its slug.
pub fn write_artwork(dir: &Path, slug: &str, created_at: &str, featured: bool) {
    write_file(
        dir,
        &format!("{slug}.mdx"),
        &format!(
            "---\ntitle: {slug}\ncreatedAt: {created_at}\nfeatured: {featured}\ncategory: [painting]\n---\nAbout {slug}.\n"
        ),
    );
}

// =========================================================================
// Repositories
// =========================================================================

pub fn blog_repo(dir: &Path) -> BlogRepository {
    Repository::new(dir, "mdx", Arc::new(MdxCompiler), Logger::disabled())
}

pub fn portfolio_repo(dir: &Path) -> PortfolioRepository {
    Repository::new(dir, "mdx", Arc::new(MdxCompiler), Logger::disabled())
}

/// Stand-in for "load time" in normalisation tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 17, 12, 0, 0).unwrap()
}
