//! Content repository: a read-through projection of a content directory.
//!
//! A content directory holds one file per item, `<slug>.<ext>`. The
//! repository lists them, normalises their front matter into fully populated
//! typed records, hides drafts unless asked, sorts, and compiles single items
//! on demand. Nothing is cached: every call reads the directory as it is now.
//!
//! The blog and the portfolio are two instances of the same [`Repository`],
//! differing only in their [`ContentKind`]: the metadata schema with its
//! default table, and the sort policy.
//!
//! ## Not found vs. hidden
//!
//! [`Repository::get`] answers `None` for a missing file, for a draft when
//! drafts were not requested, and for a body that fails to compile (logged).
//! Callers cannot tell these apart through the return value; a hidden draft
//! looks exactly like an item that was never written.

pub mod blog;
pub mod portfolio;

use crate::compile::{CompileError, Compiler};
use crate::frontmatter::{self, FrontMatterError};
use crate::logging::Logger;
use crate::naming;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub use blog::{Blog, BlogPost};
pub use portfolio::{ArtworkImages, ArtworkPiece, Portfolio};

pub type BlogRepository = Repository<Blog>;
pub type PortfolioRepository = Repository<Portfolio>;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("front matter of {path}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },
    #[error("compiling {slug}: {source}")]
    Compile {
        slug: String,
        #[source]
        source: CompileError,
    },
}

impl ContentError {
    /// Errors caused by what the author wrote, as opposed to the machine.
    pub fn is_authoring(&self) -> bool {
        !matches!(self, ContentError::Io { .. })
    }
}

/// Schema and ordering of one kind of content.
pub trait ContentKind {
    /// Normalised metadata record. Every field is populated.
    type Meta: Clone + Serialize;

    /// Singular noun used in log lines ("post", "artwork").
    const NOUN: &'static str;

    /// Build the record from raw front matter, filling documented defaults.
    /// `now` stands in for any missing timestamp.
    fn normalize(slug: &str, data: &Mapping, now: DateTime<Utc>) -> Self::Meta;

    fn slug(meta: &Self::Meta) -> &str;

    fn is_draft(meta: &Self::Meta) -> bool;

    /// Canonical listing order.
    fn order(a: &Self::Meta, b: &Self::Meta) -> Ordering;
}

/// A single item with its compiled body.
#[derive(Debug, Clone, Serialize)]
pub struct Entry<M> {
    #[serde(flatten)]
    pub meta: M,
    /// Body text as written, front matter removed.
    pub content: String,
    /// Compiled HTML.
    pub html: String,
    /// Components the body uses, in order of first appearance.
    #[serde(skip)]
    pub components: Vec<String>,
}

/// Read-only access to one content directory.
pub struct Repository<K: ContentKind> {
    dir: PathBuf,
    extension: String,
    compiler: Arc<dyn Compiler + Send + Sync>,
    logger: Logger,
    _kind: PhantomData<K>,
}

impl<K: ContentKind> Clone for Repository<K> {
    fn clone(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            extension: self.extension.clone(),
            compiler: Arc::clone(&self.compiler),
            logger: self.logger.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: ContentKind> Repository<K> {
    pub fn new(
        dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        compiler: Arc<dyn Compiler + Send + Sync>,
        logger: Logger,
    ) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            compiler,
            logger,
            _kind: PhantomData,
        }
    }

    /// All items' metadata in canonical order.
    ///
    /// A missing directory is an empty listing. Files that cannot be read
    /// (including non UTF-8 text) or whose front matter does not parse are
    /// skipped with a warning.
    pub fn list(&self, include_drafts: bool) -> Result<Vec<K::Meta>, ContentError> {
        let now = Utc::now();
        let mut items = Vec::new();
        for (slug, path) in self.content_files()? {
            let parsed = read(&path).and_then(|source| {
                frontmatter::parse(&source)
                    .map_err(|source| ContentError::FrontMatter { path: path.clone(), source })
            });
            let doc = match parsed {
                Ok(doc) => doc,
                Err(e) => {
                    self.logger
                        .warn(&format!("skipping {} {slug}: {e}", K::NOUN));
                    continue;
                }
            };
            let meta = K::normalize(&slug, &doc.data, now);
            if include_drafts || !K::is_draft(&meta) {
                items.push(meta);
            }
        }
        items.sort_by(K::order);
        Ok(items)
    }

    /// Every slug in the directory, drafts included, ascending.
    pub fn slugs(&self) -> Result<Vec<String>, ContentError> {
        Ok(self
            .content_files()?
            .into_iter()
            .map(|(slug, _)| slug)
            .collect())
    }

    /// Metadata for one slug, drafts included. No compilation.
    pub fn find(&self, slug: &str) -> Result<Option<K::Meta>, ContentError> {
        let Some(path) = self.existing_path(slug) else {
            return Ok(None);
        };
        let source = read(&path)?;
        match frontmatter::parse(&source) {
            Ok(doc) => Ok(Some(K::normalize(slug, &doc.data, Utc::now()))),
            Err(source) => {
                let err = ContentError::FrontMatter { path, source };
                self.logger
                    .error(&format!("Error reading {} {slug}", K::NOUN), &err, &[("slug", slug)]);
                Ok(None)
            }
        }
    }

    /// One item with its body compiled, or `None` when it is missing, a
    /// hidden draft, or fails to compile.
    pub fn get(&self, slug: &str, include_drafts: bool) -> Result<Option<Entry<K::Meta>>, ContentError> {
        match self.load(slug, include_drafts) {
            Ok(entry) => Ok(entry),
            Err(err) if err.is_authoring() => {
                let dir = self.dir.to_string_lossy();
                self.logger.error(
                    &format!("Error compiling {} {slug}", K::NOUN),
                    &err,
                    &[("slug", slug), ("dir", dir.as_ref())],
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Like [`get`](Self::get) but authoring errors are returned instead of
    /// logged. Used by `atelier check`.
    pub fn load(&self, slug: &str, include_drafts: bool) -> Result<Option<Entry<K::Meta>>, ContentError> {
        let Some(path) = self.existing_path(slug) else {
            return Ok(None);
        };
        let source = read(&path)?;
        let doc = frontmatter::parse(&source)
            .map_err(|source| ContentError::FrontMatter { path, source })?;
        let meta = K::normalize(slug, &doc.data, Utc::now());
        if K::is_draft(&meta) && !include_drafts {
            return Ok(None);
        }

        let compiled = self
            .logger
            .timed(&format!("compile {} {slug}", K::NOUN), || {
                self.compiler.compile(&doc.body)
            })
            .map_err(|source| ContentError::Compile {
                slug: slug.to_string(),
                source,
            })?;

        Ok(Some(Entry {
            meta,
            content: doc.body,
            html: compiled.html,
            components: compiled.components,
        }))
    }

    fn existing_path(&self, slug: &str) -> Option<PathBuf> {
        naming::path_for_slug(&self.dir, slug, &self.extension).filter(|p| p.is_file())
    }

    /// `(slug, path)` for every content file, sorted by slug.
    fn content_files(&self) -> Result<Vec<(String, PathBuf)>, ContentError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ContentError::Io {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut files: Vec<(String, PathBuf)> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter_map(|p| naming::slug_from_path(&p, &self.extension).map(|slug| (slug, p)))
            .collect();
        files.sort();
        Ok(files)
    }
}

fn read(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Front-matter field readers shared by the schemas
// ============================================================================
//
// Empty strings count as absent, so `title: ""` still gets the default.

pub(crate) fn string_field(data: &Mapping, key: &str) -> Option<String> {
    scalar_string(data.get(key)?).filter(|s| !s.is_empty())
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn bool_field(data: &Mapping, key: &str) -> Option<bool> {
    match data.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// A sequence of scalars, or a single scalar treated as a one-item list.
/// Duplicates are dropped, first occurrence kept.
pub(crate) fn string_list_field(data: &Mapping, key: &str) -> Vec<String> {
    let raw: Vec<String> = match data.get(key) {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(other) => scalar_string(other).into_iter().collect(),
        None => Vec::new(),
    };
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for item in raw {
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// RFC 3339, `YYYY-MM-DD`, or `YYYY-MM-DD[T ]HH:MM:SS` (taken as UTC).
pub(crate) fn timestamp_field(data: &Mapping, key: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(&string_field(data, key)?)
}

pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
