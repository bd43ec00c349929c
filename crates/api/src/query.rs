//! Shared query parameter types for API handlers.
//!
//! Listing dimensions accept `0` as "not set" so clients that always send
//! every field keep working; it normalises to `None` before reaching the
//! filter.

use marquee_core::content::ContentType;
use marquee_core::filter::{ContentFilter, Pagination};
use marquee_core::types::DbId;
use serde::Deserialize;

/// Optional viewer for personalized reads (`?viewer_id=`).
#[derive(Debug, Default, Deserialize)]
pub struct ViewerParams {
    pub viewer_id: Option<DbId>,
}

impl ViewerParams {
    pub fn viewer(&self) -> Option<DbId> {
        non_zero(self.viewer_id)
    }
}

/// Mandatory viewer for personalization writes.
#[derive(Debug, Deserialize)]
pub struct RequiredViewerParams {
    pub viewer_id: DbId,
}

/// Window and viewer for the unfiltered listings (`?from=&count=&viewer_id=`).
///
/// A missing or zero `count` returns every row.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub from: Option<u64>,
    pub count: Option<u64>,
    pub viewer_id: Option<DbId>,
}

impl PageParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.from.unwrap_or(0), self.count.unwrap_or(0))
    }

    pub fn viewer(&self) -> Option<DbId> {
        non_zero(self.viewer_id)
    }
}

/// Filter, window and viewer for `GET /contents`.
#[derive(Debug, Default, Deserialize)]
pub struct ContentListParams {
    pub year: Option<i32>,
    pub genre: Option<DbId>,
    pub country: Option<DbId>,
    pub actor: Option<DbId>,
    pub director: Option<DbId>,
    pub is_free: Option<bool>,
    pub content_type: Option<ContentType>,
    pub from: Option<u64>,
    pub count: Option<u64>,
    pub viewer_id: Option<DbId>,
}

impl ContentListParams {
    pub fn filter(&self) -> ContentFilter {
        ContentFilter {
            year: self.year.filter(|&y| y != 0),
            genre: non_zero(self.genre),
            country: non_zero(self.country),
            actor: non_zero(self.actor),
            director: non_zero(self.director),
            is_free: self.is_free,
            content_type: self.content_type,
        }
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.from.unwrap_or(0), self.count.unwrap_or(0))
    }

    pub fn viewer(&self) -> Option<DbId> {
        non_zero(self.viewer_id)
    }
}

fn non_zero(id: Option<DbId>) -> Option<DbId> {
    id.filter(|&id| id != 0)
}
