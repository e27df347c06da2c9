//! The assembled site: configuration, both repositories, the preview gate
//! and the logger, wired once at startup.
//!
//! Page methods take the visitor's [`PreviewState`] and answer rendered
//! markup or a [`SiteError`]. Listings only ever show published items.
//! Detail pages load drafts when preview is enabled; otherwise a draft is
//! indistinguishable from an absent item.

use crate::compile::{Compiler, MdxCompiler};
use crate::config::SiteConfig;
use crate::content::portfolio::unique_categories;
use crate::content::{BlogRepository, PortfolioRepository, Repository};
use crate::error::SiteError;
use crate::logging::Logger;
use crate::preview::{ContentKindParam, PreviewGate, PreviewState};
use crate::render::{self, PageContext};
use maud::Markup;
use std::sync::Arc;

/// Number of posts and featured artworks on the home page.
pub const HOME_LIMIT: usize = 3;

#[derive(Clone)]
pub struct Site {
    config: SiteConfig,
    blog: BlogRepository,
    portfolio: PortfolioRepository,
    gate: PreviewGate,
    logger: Logger,
}

impl Site {
    pub fn new(config: SiteConfig, logger: Logger) -> Self {
        Self::with_compiler(config, Arc::new(MdxCompiler), logger)
    }

    pub fn with_compiler(
        config: SiteConfig,
        compiler: Arc<dyn Compiler + Send + Sync>,
        logger: Logger,
    ) -> Self {
        let extension = config.content.extension.clone();
        let blog = Repository::new(
            config.blog_dir(),
            extension.clone(),
            Arc::clone(&compiler),
            logger.clone(),
        );
        let portfolio =
            Repository::new(config.portfolio_dir(), extension, compiler, logger.clone());
        let gate = PreviewGate::new(&config.preview);
        Self {
            config,
            blog,
            portfolio,
            gate,
            logger,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn blog(&self) -> &BlogRepository {
        &self.blog
    }

    pub fn portfolio(&self) -> &PortfolioRepository {
        &self.portfolio
    }

    pub fn gate(&self) -> &PreviewGate {
        &self.gate
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    fn context(&self, preview: PreviewState) -> PageContext<'_> {
        PageContext {
            site_title: &self.config.site_title,
            preview,
        }
    }

    /// `Some(is_draft)` for an existing item of `kind`, drafts included.
    pub fn lookup(&self, kind: ContentKindParam, slug: &str) -> Result<Option<bool>, SiteError> {
        Ok(match kind {
            ContentKindParam::Blog => self.blog.find(slug)?.map(|p| p.is_draft),
            ContentKindParam::Portfolio => self.portfolio.find(slug)?.map(|a| a.is_draft),
        })
    }

    pub fn home_page(&self, preview: PreviewState) -> Result<Markup, SiteError> {
        let recent = self.blog.recent(HOME_LIMIT)?;
        let featured = self.portfolio.featured(HOME_LIMIT)?;
        Ok(render::render_home(&self.context(preview), &recent, &featured))
    }

    pub fn blog_index_page(&self, preview: PreviewState) -> Result<Markup, SiteError> {
        let posts = self.blog.list(false)?;
        Ok(render::render_blog_index(&self.context(preview), &posts))
    }

    pub fn blog_post_page(&self, slug: &str, preview: PreviewState) -> Result<Markup, SiteError> {
        let entry = self
            .blog
            .get(slug, preview.is_enabled())?
            .ok_or(SiteError::NotFound)?;
        Ok(render::render_blog_post(&self.context(preview), &entry))
    }

    /// Portfolio listing, optionally narrowed to one category. The filter
    /// bar always lists every category.
    pub fn portfolio_page(
        &self,
        category: Option<&str>,
        preview: PreviewState,
    ) -> Result<Markup, SiteError> {
        let all = self.portfolio.list(false)?;
        let categories = unique_categories(&all);
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let shown = match category {
            Some(wanted) => self.portfolio.by_category(wanted)?,
            None => all,
        };
        Ok(render::render_portfolio_index(
            &self.context(preview),
            &shown,
            &categories,
            category,
        ))
    }

    pub fn artwork_page(&self, slug: &str, preview: PreviewState) -> Result<Markup, SiteError> {
        let entry = self
            .portfolio
            .get(slug, preview.is_enabled())?
            .ok_or(SiteError::NotFound)?;
        Ok(render::render_artwork(&self.context(preview), &entry))
    }

    /// Error page for an HTML route, built from the error's envelope.
    pub fn error_page(&self, err: &SiteError, path: &str, preview: PreviewState) -> Markup {
        let envelope = err.to_envelope(path, self.config.mode);
        render::render_error_page(&self.context(preview), &envelope)
    }
}
