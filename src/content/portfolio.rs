//! Portfolio artwork pieces.
//!
//! | Front matter       | Field              | Default                               |
//! |--------------------|--------------------|---------------------------------------|
//! | `title`            | `title`            | `"Untitled"`                          |
//! | `description`      | `description`      | `""`                                  |
//! | `medium`           | `medium`           | `"Mixed Media"`                       |
//! | `dimensions`       | `dimensions`       | `""`                                  |
//! | `year`             | `year`             | current year                          |
//! | `category`         | `category`         | `["uncategorized"]`                   |
//! | `featured`         | `featured`         | `false`                               |
//! | `available`        | `available`        | `false`                               |
//! | `price`            | `price`            | none                                  |
//! | `images.main`      | `images.main`      | `/images/portfolio/placeholder.jpg`   |
//! | `images.gallery`   | `images.gallery`   | `[]`                                  |
//! | `images.thumbnail` | `images.thumbnail` | `images.main`                         |
//! | `createdAt`        | `created_at`       | load time                             |
//! | `isDraft`          | `is_draft`         | `false`                               |
//!
//! Listings put featured pieces first, newest first within each group.

use super::{
    ContentError, ContentKind, Repository, bool_field, string_field, string_list_field,
    timestamp_field,
};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_MEDIUM: &str = "Mixed Media";
pub const DEFAULT_CATEGORY: &str = "uncategorized";
pub const PLACEHOLDER_IMAGE: &str = "/images/portfolio/placeholder.jpg";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkPiece {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub medium: String,
    pub dimensions: String,
    pub year: String,
    /// Never empty.
    pub category: Vec<String>,
    pub featured: bool,
    pub available: bool,
    pub price: Option<String>,
    pub images: ArtworkImages,
    pub created_at: DateTime<Utc>,
    pub is_draft: bool,
}

impl ArtworkPiece {
    /// Price is only shown for pieces that can still be bought.
    pub fn display_price(&self) -> Option<&str> {
        self.price.as_deref().filter(|_| self.available)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtworkImages {
    pub main: String,
    pub gallery: Vec<String>,
    pub thumbnail: String,
}

impl ArtworkImages {
    fn from_front_matter(data: &Mapping) -> Self {
        let images = match data.get("images") {
            Some(Value::Mapping(m)) => m.clone(),
            _ => Mapping::new(),
        };
        let main = string_field(&images, "main").unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());
        let thumbnail = string_field(&images, "thumbnail").unwrap_or_else(|| main.clone());
        Self {
            gallery: string_list_field(&images, "gallery"),
            main,
            thumbnail,
        }
    }
}

/// Schema marker for the portfolio repository.
#[derive(Debug, Clone, Copy)]
pub struct Portfolio;

impl ContentKind for Portfolio {
    type Meta = ArtworkPiece;
    const NOUN: &'static str = "artwork";

    fn normalize(slug: &str, data: &Mapping, now: DateTime<Utc>) -> ArtworkPiece {
        let mut category = string_list_field(data, "category");
        if category.is_empty() {
            category.push(DEFAULT_CATEGORY.to_string());
        }

        ArtworkPiece {
            slug: slug.to_string(),
            title: string_field(data, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: string_field(data, "description").unwrap_or_default(),
            medium: string_field(data, "medium").unwrap_or_else(|| DEFAULT_MEDIUM.to_string()),
            dimensions: string_field(data, "dimensions").unwrap_or_default(),
            year: string_field(data, "year").unwrap_or_else(|| now.year().to_string()),
            category,
            featured: bool_field(data, "featured").unwrap_or(false),
            available: bool_field(data, "available").unwrap_or(false),
            price: string_field(data, "price"),
            images: ArtworkImages::from_front_matter(data),
            created_at: timestamp_field(data, "createdAt").unwrap_or(now),
            is_draft: bool_field(data, "isDraft").unwrap_or(false),
        }
    }

    fn slug(meta: &ArtworkPiece) -> &str {
        &meta.slug
    }

    fn is_draft(meta: &ArtworkPiece) -> bool {
        meta.is_draft
    }

    fn order(a: &ArtworkPiece, b: &ArtworkPiece) -> Ordering {
        b.featured
            .cmp(&a.featured)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.slug.cmp(&b.slug))
    }
}

impl Repository<Portfolio> {
    /// Up to `limit` featured, published pieces in listing order.
    pub fn featured(&self, limit: usize) -> Result<Vec<ArtworkPiece>, ContentError> {
        Ok(self
            .list(false)?
            .into_iter()
            .filter(|a| a.featured)
            .take(limit)
            .collect())
    }

    /// Published pieces tagged with `category`, compared case-insensitively.
    pub fn by_category(&self, category: &str) -> Result<Vec<ArtworkPiece>, ContentError> {
        let wanted = category.to_lowercase();
        Ok(self
            .list(false)?
            .into_iter()
            .filter(|a| a.category.iter().any(|c| c.to_lowercase() == wanted))
            .collect())
    }
}

/// Distinct category names across `artworks`, sorted.
pub fn unique_categories(artworks: &[ArtworkPiece]) -> Vec<String> {
    artworks
        .iter()
        .flat_map(|a| a.category.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
