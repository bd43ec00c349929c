//! Content row model.

use marquee_core::content::{Content, ContentType};
use marquee_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A `content` row plus the viewer overlay columns every read projects.
///
/// `is_liked` / `is_favourite` are `NULL` on reads made without a viewer.
#[derive(Debug, Clone, FromRow)]
pub struct ContentRow {
    pub id: DbId,
    pub name: String,
    pub original_name: String,
    pub description: String,
    pub short_description: String,
    pub year: i32,
    pub images: String,
    pub content_type: String,
    pub is_free: bool,
    pub created_at: Timestamp,
    pub is_liked: Option<bool>,
    pub is_favourite: Option<bool>,
}

impl ContentRow {
    /// Convert into a scalar-only aggregate (relation lists left empty).
    pub fn into_content(self) -> Result<Content, sqlx::Error> {
        let content_type = self
            .content_type
            .parse::<ContentType>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Content {
            id: self.id,
            name: self.name,
            original_name: self.original_name,
            description: self.description,
            short_description: self.short_description,
            year: self.year,
            images: self.images,
            content_type,
            is_free: self.is_free,
            is_liked: self.is_liked,
            is_favourite: self.is_favourite,
            created_at: Some(self.created_at),
            ..Content::default()
        })
    }
}
