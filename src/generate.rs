//! Static export.
//!
//! Renders every published page to plain files so the site can be hosted
//! without the server. Drafts never reach the output: detail pages are
//! rendered with preview disabled and any slug that answers NotFound is
//! skipped.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                 # Home
//! ├── blog/
//! │   ├── index.html             # Blog listing
//! │   └── first-light/
//! │       └── index.html         # Post
//! ├── portfolio/
//! │   ├── index.html             # Portfolio listing
//! │   └── harbour-at-dusk/
//! │       └── index.html         # Artwork
//! ├── 404.html
//! └── images/...                 # Copied from the public directory
//! ```
//!
//! Category filtering needs the query string, so the exported portfolio
//! listing always shows every category.

use crate::error::SiteError;
use crate::preview::PreviewState;
use crate::site::Site;
use maud::Markup;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("walking public directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("rendering {route}: {source}")]
    Render {
        route: String,
        #[source]
        source: SiteError,
    },
}

/// One written page.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPage {
    pub route: String,
    /// Relative to the output directory.
    pub file: PathBuf,
}

/// A slug that exists on disk but was not exported.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedItem {
    pub noun: &'static str,
    pub slug: String,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub pages: Vec<GeneratedPage>,
    pub skipped: Vec<SkippedItem>,
    /// Public assets copied, relative to the output directory.
    pub assets: Vec<PathBuf>,
}

pub fn build(site: &Site, output_dir: &Path) -> Result<BuildReport, GenerateError> {
    let preview = PreviewState::Disabled;
    let mut report = BuildReport::default();

    create_dir(output_dir)?;
    report.assets = copy_public(&site.config().build.public_dir, output_dir)?;

    write_page(output_dir, "/", site.home_page(preview), &mut report)?;
    write_page(output_dir, "/blog", site.blog_index_page(preview), &mut report)?;
    write_page(
        output_dir,
        "/portfolio",
        site.portfolio_page(None, preview),
        &mut report,
    )?;

    for slug in site.blog().slugs().map_err(|e| render_error("/blog", e.into()))? {
        let route = format!("/blog/{slug}");
        match site.blog_post_page(&slug, preview) {
            Err(SiteError::NotFound | SiteError::CompilationFailure { .. }) => {
                report.skipped.push(SkippedItem { noun: "post", slug });
            }
            page => write_page(output_dir, &route, page, &mut report)?,
        }
    }

    for slug in site
        .portfolio()
        .slugs()
        .map_err(|e| render_error("/portfolio", e.into()))?
    {
        let route = format!("/portfolio/{slug}");
        match site.artwork_page(&slug, preview) {
            Err(SiteError::NotFound | SiteError::CompilationFailure { .. }) => {
                report.skipped.push(SkippedItem {
                    noun: "artwork",
                    slug,
                });
            }
            page => write_page(output_dir, &route, page, &mut report)?,
        }
    }

    let not_found = site.error_page(&SiteError::NotFound, "/404.html", preview);
    write_markup(output_dir, Path::new("404.html"), not_found)?;

    site.logger().info(&format!(
        "exported {} pages to {}",
        report.pages.len(),
        output_dir.display()
    ));
    Ok(report)
}

/// `/` → `index.html`, `/blog/x` → `blog/x/index.html`.
pub fn route_to_file(route: &str) -> PathBuf {
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        PathBuf::from("index.html")
    } else {
        Path::new(trimmed).join("index.html")
    }
}

fn write_page(
    output_dir: &Path,
    route: &str,
    page: Result<Markup, SiteError>,
    report: &mut BuildReport,
) -> Result<(), GenerateError> {
    let markup = page.map_err(|source| render_error(route, source))?;
    let file = route_to_file(route);
    write_markup(output_dir, &file, markup)?;
    report.pages.push(GeneratedPage {
        route: route.to_string(),
        file,
    });
    Ok(())
}

fn write_markup(output_dir: &Path, relative: &Path, markup: Markup) -> Result<(), GenerateError> {
    let path = output_dir.join(relative);
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    fs::write(&path, markup.into_string()).map_err(|source| GenerateError::Io { path, source })
}

fn create_dir(path: &Path) -> Result<(), GenerateError> {
    fs::create_dir_all(path).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn render_error(route: &str, source: SiteError) -> GenerateError {
    GenerateError::Render {
        route: route.to_string(),
        source,
    }
}

/// Copy the public asset tree into the output. A missing public directory
/// copies nothing.
fn copy_public(public_dir: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    if !public_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut copied = Vec::new();
    for entry in WalkDir::new(public_dir).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(public_dir) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let dest = output_dir.join(relative);
        if entry.file_type().is_dir() {
            create_dir(&dest)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &dest).map_err(|source| GenerateError::Io {
                path: dest.clone(),
                source,
            })?;
            copied.push(relative.to_path_buf());
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::logging::Logger;
    use crate::test_helpers::*;

    fn site_with_public(root: &Path) -> Site {
        let mut config = SiteConfig::default();
        config.content.root = root.join("content");
        config.build.public_dir = root.join("public");
        Site::new(config, Logger::disabled())
    }

    #[test]
    fn route_to_file_mapping() {
        assert_eq!(route_to_file("/"), PathBuf::from("index.html"));
        assert_eq!(route_to_file("/blog"), PathBuf::from("blog/index.html"));
        assert_eq!(
            route_to_file("/blog/first-light"),
            PathBuf::from("blog/first-light/index.html")
        );
    }

    #[test]
    fn exports_published_pages_and_skips_drafts() {
        let tmp = content_dir();
        let blog = tmp.path().join("content/blog");
        write_post(&blog, "live", "2024-01-01", false);
        write_post(&blog, "wip", "2024-02-01", true);
        write_file(&blog, "broken.mdx", "---\ntitle: B\n---\n<Unknown />\n");
        write_artwork(&tmp.path().join("content/portfolio"), "harbour", "2024-01-01", true);

        let out = tmp.path().join("dist");
        let report = build(&site_with_public(tmp.path()), &out).unwrap();

        assert!(out.join("index.html").is_file());
        assert!(out.join("blog/live/index.html").is_file());
        assert!(out.join("portfolio/harbour/index.html").is_file());
        assert!(out.join("404.html").is_file());
        assert!(!out.join("blog/wip").exists());
        assert!(!out.join("blog/broken").exists());

        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(skipped, vec!["broken", "wip"]);

        let listing = fs::read_to_string(out.join("blog/index.html")).unwrap();
        assert!(!listing.contains("/blog/wip"));
    }

    #[test]
    fn copies_public_assets() {
        let tmp = content_dir();
        write_file(&tmp.path().join("public"), "images/portfolio/placeholder.jpg", "jpg");
        write_file(&tmp.path().join("public"), "robots.txt", "User-agent: *");

        let out = tmp.path().join("dist");
        let report = build(&site_with_public(tmp.path()), &out).unwrap();

        assert!(out.join("images/portfolio/placeholder.jpg").is_file());
        assert!(out.join("robots.txt").is_file());
        assert_eq!(report.assets.len(), 2);
    }

    #[test]
    fn empty_content_still_exports_shell() {
        let tmp = content_dir();
        let out = tmp.path().join("dist");
        let report = build(&site_with_public(tmp.path()), &out).unwrap();
        let routes: Vec<&str> = report.pages.iter().map(|p| p.route.as_str()).collect();
        assert_eq!(routes, vec!["/", "/blog", "/portfolio"]);
        assert!(report.skipped.is_empty());
    }
}
