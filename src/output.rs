//! CLI output formatting for `check` and `build`.
//!
//! # Information-First Display
//!
//! Every item leads with its positional index and title. The slug, draft
//! flag and outcome follow as indented context lines, so the output reads
//! as a content inventory.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Posts
//! 001 First Light
//!     Slug: first-light
//!     Components: Callout, Figure
//! 002 Notes From the Harbour (draft)
//!     Slug: harbour-notes
//!     Error: line 4: <Callout> is never closed
//!
//! Artworks
//! 001 Harbour at Dusk
//!     Slug: harbour-at-dusk
//!
//! Checked 3 items, 1 failed
//! ```
//!
//! ## Build
//!
//! ```text
//! / → index.html
//! /blog → blog/index.html
//! /blog/first-light → blog/first-light/index.html
//!
//! Skipped
//!     post harbour-notes
//!
//! Assets
//!     images/portfolio/placeholder.jpg
//!
//! Generated 3 pages, skipped 1, copied 1 asset
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::check::{CheckReport, CheckedItem};
use crate::generate::BuildReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn item_lines(position: usize, item: &CheckedItem) -> Vec<String> {
    let draft = if item.is_draft { " (draft)" } else { "" };
    let mut lines = vec![format!("{} {}{}", format_index(position), item.title, draft)];
    lines.push(format!("    Slug: {}", item.slug));
    match &item.outcome {
        Ok(components) if !components.is_empty() => {
            lines.push(format!("    Components: {}", components.join(", ")));
        }
        Ok(_) => {}
        Err(message) => lines.push(format!("    Error: {message}")),
    }
    lines
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(report: &CheckReport) -> Vec<String> {
    let mut lines = Vec::new();

    for (heading, noun) in [("Posts", "post"), ("Artworks", "artwork")] {
        let items: Vec<&CheckedItem> = report.items.iter().filter(|i| i.noun == noun).collect();
        if items.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(heading.to_string());
        for (i, item) in items.iter().enumerate() {
            lines.extend(item_lines(i + 1, item));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    let failed = report.failures().count();
    lines.push(format!(
        "Checked {}, {} failed",
        plural(report.items.len(), "item"),
        failed
    ));
    lines
}

pub fn print_check_output(report: &CheckReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .pages
        .iter()
        .map(|p| format!("{} → {}", p.route, p.file.display()))
        .collect();

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for item in &report.skipped {
            lines.push(format!("    {} {}", item.noun, item.slug));
        }
    }

    if !report.assets.is_empty() {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for asset in &report.assets {
            lines.push(format!("    {}", asset.display()));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, skipped {}, copied {}",
        plural(report.pages.len(), "page"),
        report.skipped.len(),
        plural(report.assets.len(), "asset")
    ));
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{GeneratedPage, SkippedItem};
    use std::path::PathBuf;

    fn item(noun: &'static str, slug: &str, title: &str, outcome: Result<Vec<String>, String>) -> CheckedItem {
        CheckedItem {
            noun,
            slug: slug.into(),
            title: title.into(),
            is_draft: false,
            outcome,
        }
    }

    #[test]
    fn check_output_groups_by_kind() {
        let mut draft = item("post", "notes", "Notes", Err("line 4: <Callout> is never closed".into()));
        draft.is_draft = true;
        let report = CheckReport {
            items: vec![
                item("post", "first-light", "First Light", Ok(vec!["Callout".into(), "Figure".into()])),
                draft,
                item("artwork", "harbour", "Harbour", Ok(vec![])),
            ],
        };
        let lines = format_check_output(&report);
        assert_eq!(
            lines,
            vec![
                "Posts",
                "001 First Light",
                "    Slug: first-light",
                "    Components: Callout, Figure",
                "002 Notes (draft)",
                "    Slug: notes",
                "    Error: line 4: <Callout> is never closed",
                "",
                "Artworks",
                "001 Harbour",
                "    Slug: harbour",
                "",
                "Checked 3 items, 1 failed",
            ]
        );
    }

    #[test]
    fn empty_check_output() {
        let lines = format_check_output(&CheckReport::default());
        assert_eq!(lines, vec!["Checked 0 items, 0 failed"]);
    }

    #[test]
    fn build_output_lists_pages_skips_and_assets() {
        let report = BuildReport {
            pages: vec![
                GeneratedPage {
                    route: "/".into(),
                    file: PathBuf::from("index.html"),
                },
                GeneratedPage {
                    route: "/blog".into(),
                    file: PathBuf::from("blog/index.html"),
                },
            ],
            skipped: vec![SkippedItem {
                noun: "post",
                slug: "wip".into(),
            }],
            assets: vec![PathBuf::from("robots.txt")],
        };
        let lines = format_build_output(&report);
        assert_eq!(lines[0], "/ → index.html");
        assert_eq!(lines[1], "/blog → blog/index.html");
        assert!(lines.contains(&"    post wip".to_string()));
        assert!(lines.contains(&"    robots.txt".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "Generated 2 pages, skipped 1, copied 1 asset"
        );
    }
}
