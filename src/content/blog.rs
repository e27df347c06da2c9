//! Blog posts.
//!
//! | Front matter  | Field          | Default          |
//! |---------------|----------------|------------------|
//! | `title`       | `title`        | `"Untitled"`     |
//! | `excerpt`     | `excerpt`      | `""`             |
//! | `publishedAt` | `published_at` | load time        |
//! | `tags`        | `tags`         | `[]`             |
//! | `isDraft`     | `is_draft`     | `false`          |
//! | `coverImage`  | `cover_image`  | none             |
//! | `author`      | `author`       | `"Artist"`       |
//!
//! Listings are newest first.

use super::{
    ContentKind, Repository, bool_field, string_field, string_list_field, timestamp_field,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_yaml::Mapping;
use std::cmp::Ordering;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_AUTHOR: &str = "Artist";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub published_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub is_draft: bool,
    pub cover_image: Option<String>,
    pub author: String,
}

/// Schema marker for the blog repository.
#[derive(Debug, Clone, Copy)]
pub struct Blog;

impl ContentKind for Blog {
    type Meta = BlogPost;
    const NOUN: &'static str = "post";

    fn normalize(slug: &str, data: &Mapping, now: DateTime<Utc>) -> BlogPost {
        BlogPost {
            slug: slug.to_string(),
            title: string_field(data, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            excerpt: string_field(data, "excerpt").unwrap_or_default(),
            published_at: timestamp_field(data, "publishedAt").unwrap_or(now),
            tags: string_list_field(data, "tags"),
            is_draft: bool_field(data, "isDraft").unwrap_or(false),
            cover_image: string_field(data, "coverImage"),
            author: string_field(data, "author").unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        }
    }

    fn slug(meta: &BlogPost) -> &str {
        &meta.slug
    }

    fn is_draft(meta: &BlogPost) -> bool {
        meta.is_draft
    }

    fn order(a: &BlogPost, b: &BlogPost) -> Ordering {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.slug.cmp(&b.slug))
    }
}

impl Repository<Blog> {
    /// The `limit` newest published posts.
    pub fn recent(&self, limit: usize) -> Result<Vec<BlogPost>, super::ContentError> {
        let mut posts = self.list(false)?;
        posts.truncate(limit);
        Ok(posts)
    }
}
