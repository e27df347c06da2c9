//! Content check: load and compile every item, drafts included.
//!
//! Unlike the serving path, failures are collected and reported instead of
//! being logged and hidden.

use crate::content::{ContentError, ContentKind, Repository};
use crate::naming;
use crate::site::Site;

#[derive(Debug, Clone, PartialEq)]
pub struct CheckedItem {
    pub noun: &'static str,
    pub slug: String,
    pub title: String,
    pub is_draft: bool,
    /// Components used on success, the error message on failure.
    pub outcome: Result<Vec<String>, String>,
}

#[derive(Debug, Default)]
pub struct CheckReport {
    pub items: Vec<CheckedItem>,
}

impl CheckReport {
    pub fn failures(&self) -> impl Iterator<Item = &CheckedItem> {
        self.items.iter().filter(|i| i.outcome.is_err())
    }

    pub fn is_ok(&self) -> bool {
        self.failures().next().is_none()
    }
}

pub fn check(site: &Site) -> Result<CheckReport, ContentError> {
    let mut report = CheckReport::default();
    check_repository(site.blog(), |p| (p.title.clone(), p.is_draft), &mut report)?;
    check_repository(site.portfolio(), |a| (a.title.clone(), a.is_draft), &mut report)?;
    Ok(report)
}

fn check_repository<K: ContentKind>(
    repo: &Repository<K>,
    summary: impl Fn(&K::Meta) -> (String, bool),
    report: &mut CheckReport,
) -> Result<(), ContentError> {
    for slug in repo.slugs()? {
        let item = match repo.load(&slug, true) {
            Ok(Some(entry)) => {
                let (title, is_draft) = summary(&entry.meta);
                CheckedItem {
                    noun: K::NOUN,
                    slug: K::slug(&entry.meta).to_string(),
                    title,
                    is_draft,
                    outcome: Ok(entry.components),
                }
            }
            Ok(None) => continue,
            Err(err) if err.is_authoring() => {
                let meta = repo.find(&slug).ok().flatten();
                let (title, is_draft) = meta
                    .as_ref()
                    .map(&summary)
                    .unwrap_or_else(|| (naming::display_title(&slug), false));
                CheckedItem {
                    noun: K::NOUN,
                    slug,
                    title,
                    is_draft,
                    outcome: Err(err.to_string()),
                }
            }
            Err(err) => return Err(err),
        };
        report.items.push(item);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::logging::Logger;
    use crate::test_helpers::*;

    #[test]
    fn collects_failures_including_drafts() {
        let tmp = content_dir();
        let blog = tmp.path().join("blog");
        write_post(&blog, "fine", "2024-01-01", false);
        write_file(&blog, "wip.mdx", "---\ntitle: WIP\nisDraft: true\n---\n<Callout>\nnever closed\n");
        write_file(
            &tmp.path().join("portfolio"),
            "harbour.mdx",
            "---\ntitle: Harbour\n---\n<Artwork src=\"/h.jpg\" />\n",
        );

        let mut config = SiteConfig::default();
        config.content.root = tmp.path().to_path_buf();
        let report = check(&Site::new(config, Logger::disabled())).unwrap();

        assert_eq!(report.items.len(), 3);
        assert!(!report.is_ok());
        let failed: Vec<&CheckedItem> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].slug, "wip");
        assert_eq!(failed[0].title, "WIP");
        assert!(failed[0].is_draft);

        let harbour = report.items.iter().find(|i| i.slug == "harbour").unwrap();
        assert_eq!(harbour.noun, "artwork");
        assert_eq!(harbour.outcome, Ok(vec!["Artwork".to_string()]));
    }

    #[test]
    fn empty_site_is_ok() {
        let tmp = content_dir();
        let mut config = SiteConfig::default();
        config.content.root = tmp.path().to_path_buf();
        let report = check(&Site::new(config, Logger::disabled())).unwrap();
        assert!(report.items.is_empty());
        assert!(report.is_ok());
    }
}
