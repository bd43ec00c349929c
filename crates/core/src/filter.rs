//! Listing inputs: the optional-dimension content filter and the pagination
//! window.

use serde::{Deserialize, Serialize};

use crate::content::{ContentType, RelationKind};
use crate::types::DbId;

/// Optional-dimension filter for content listings.
///
/// Every dimension is independent; `None` means "do not filter on this". Any
/// subset may be set at once and the result is the AND of all set dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentFilter {
    pub year: Option<i32>,
    pub genre: Option<DbId>,
    pub country: Option<DbId>,
    pub actor: Option<DbId>,
    pub director: Option<DbId>,
    pub is_free: Option<bool>,
    pub content_type: Option<ContentType>,
}

impl ContentFilter {
    /// Lookup entity ID the listing is restricted to for `kind`, if any.
    pub fn relation(&self, kind: RelationKind) -> Option<DbId> {
        match kind {
            RelationKind::Country => self.country,
            RelationKind::Genre => self.genre,
            RelationKind::Actor => self.actor,
            RelationKind::Director => self.director,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ContentFilter::default()
    }
}

/// `(from, count)` window over an ordered listing. `count == 0` is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub from: u64,
    pub count: u64,
}

impl Pagination {
    /// Every row, no offset.
    pub const UNBOUNDED: Pagination = Pagination { from: 0, count: 0 };

    pub fn new(from: u64, count: u64) -> Self {
        Self { from, count }
    }

    /// `true` when no `LIMIT`/`OFFSET` should be applied.
    pub fn is_unbounded(&self) -> bool {
        self.count == 0
    }
}
