//! Content aggregate: the `Content` root, its lookup entities and the
//! partial-update merge rules.
//!
//! A `Content` owns value copies of the countries, genres, actors and
//! directors it was hydrated with. Personalization fields (`is_liked`,
//! `is_favourite`) only carry data on reads made for a specific viewer and are
//! never written back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Content type
// ---------------------------------------------------------------------------

/// Discriminates movies from TV shows. Stored as text (`movie` / `tv_show`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Movie,
    TvShow,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::TvShow => "tv_show",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is neither `movie` nor `tv_show`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown content type: {0:?}")]
pub struct UnknownContentType(pub String);

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(ContentType::Movie),
            "tv_show" => Ok(ContentType::TvShow),
            other => Err(UnknownContentType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Relation kinds
// ---------------------------------------------------------------------------

/// The four many-to-many relations of a `Content`.
///
/// Every table and column name the query layer interpolates into SQL comes
/// from here; nothing user-supplied is ever spliced into a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Country,
    Genre,
    Actor,
    Director,
}

impl RelationKind {
    /// All kinds, in the order writes are applied.
    pub const ALL: [RelationKind; 4] = [
        RelationKind::Country,
        RelationKind::Genre,
        RelationKind::Actor,
        RelationKind::Director,
    ];

    /// Reference table holding the lookup entities.
    pub fn lookup_table(self) -> &'static str {
        match self {
            RelationKind::Country => "countries",
            RelationKind::Genre => "genres",
            RelationKind::Actor => "actors",
            RelationKind::Director => "directors",
        }
    }

    /// `(content_id, <entity>_id)` pair table.
    pub fn join_table(self) -> &'static str {
        match self {
            RelationKind::Country => "content_country",
            RelationKind::Genre => "content_genre",
            RelationKind::Actor => "content_actor",
            RelationKind::Director => "content_director",
        }
    }

    /// Entity column of the join table.
    pub fn entity_column(self) -> &'static str {
        match self {
            RelationKind::Country => "country_id",
            RelationKind::Genre => "genre_id",
            RelationKind::Actor => "actor_id",
            RelationKind::Director => "director_id",
        }
    }

    /// Human-readable entity name used in `CoreError::NotFound`.
    pub fn entity_name(self) -> &'static str {
        match self {
            RelationKind::Country => "Country",
            RelationKind::Genre => "Genre",
            RelationKind::Actor => "Actor",
            RelationKind::Director => "Director",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity_name())
    }
}

// ---------------------------------------------------------------------------
// Lookup entities
// ---------------------------------------------------------------------------

/// A small reference entity (`{id, name}`) that content links to.
pub trait LookupEntity: Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: RelationKind;

    fn from_parts(id: DbId, name: String) -> Self;
    fn id(&self) -> DbId;
    fn name(&self) -> &str;
}

macro_rules! lookup_entity {
    ($(#[$meta:meta])* $ty:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $ty {
            pub id: DbId,
            pub name: String,
        }

        impl LookupEntity for $ty {
            const KIND: RelationKind = RelationKind::$kind;

            fn from_parts(id: DbId, name: String) -> Self {
                Self { id, name }
            }

            fn id(&self) -> DbId {
                self.id
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

lookup_entity!(
    /// A production country.
    Country => Country
);
lookup_entity!(
    /// A genre label such as "Comedy".
    Genre => Genre
);
lookup_entity!(Actor => Actor);
lookup_entity!(Director => Director);

// ---------------------------------------------------------------------------
// Aggregate root
// ---------------------------------------------------------------------------

/// The content aggregate.
///
/// `id` is `0` until the row has been inserted; the repository writes the
/// generated key back on insert and never changes it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: DbId,
    pub name: String,
    pub original_name: String,
    pub description: String,
    pub short_description: String,
    pub year: i32,
    /// Opaque media-asset directory.
    pub images: String,
    pub content_type: ContentType,
    pub is_free: bool,
    pub countries: Vec<Country>,
    pub genres: Vec<Genre>,
    pub actors: Vec<Actor>,
    pub directors: Vec<Director>,
    /// Viewer's rating: `None` when unrated or when no viewer was given.
    pub is_liked: Option<bool>,
    /// Viewer's favourite flag: `None` only when no viewer was given.
    pub is_favourite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl Content {
    /// IDs of the related entities of one kind, in stored order.
    pub fn relation_ids(&self, kind: RelationKind) -> Vec<DbId> {
        match kind {
            RelationKind::Country => self.countries.iter().map(|e| e.id).collect(),
            RelationKind::Genre => self.genres.iter().map(|e| e.id).collect(),
            RelationKind::Actor => self.actors.iter().map(|e| e.id).collect(),
            RelationKind::Director => self.directors.iter().map(|e| e.id).collect(),
        }
    }

    /// Drop viewer-specific state before the aggregate is handed to a write.
    pub fn clear_personalization(&mut self) {
        self.is_liked = None;
        self.is_favourite = None;
    }

    /// Apply the scalar half of a patch using "replace if non-empty" rules.
    ///
    /// - strings are replaced only by non-empty values;
    /// - `year` only by a non-zero value;
    /// - `content_type` only by `movie` or `tv_show` (anything else is ignored);
    /// - `is_free` only when present.
    ///
    /// An empty patch therefore leaves the content untouched, and a field can
    /// not be cleared through this path. Relation lists are merged by the
    /// usecase, which has to resolve them first.
    pub fn merge_scalars(&mut self, patch: &ContentPatch) {
        replace_if_non_empty(&mut self.name, &patch.name);
        replace_if_non_empty(&mut self.original_name, &patch.original_name);
        replace_if_non_empty(&mut self.description, &patch.description);
        replace_if_non_empty(&mut self.short_description, &patch.short_description);
        replace_if_non_empty(&mut self.images, &patch.images);

        if patch.year != 0 {
            self.year = patch.year;
        }
        if let Ok(content_type) = patch.content_type.parse::<ContentType>() {
            self.content_type = content_type;
        }
        if let Some(is_free) = patch.is_free {
            self.is_free = is_free;
        }
    }
}

/// De-duplicate relation IDs, keeping the first occurrence of each.
pub fn unique_ids(ids: &[DbId]) -> Vec<DbId> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn replace_if_non_empty(field: &mut String, incoming: &str) {
    if !incoming.is_empty() {
        *field = incoming.to_string();
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Partial update for an existing content item.
///
/// Empty strings, a zero `year`, an unrecognised `content_type` and empty ID
/// lists all mean "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentPatch {
    pub name: String,
    pub original_name: String,
    pub description: String,
    pub short_description: String,
    pub images: String,
    pub year: i32,
    pub content_type: String,
    pub is_free: Option<bool>,
    pub countries: Vec<DbId>,
    pub genres: Vec<DbId>,
    pub actors: Vec<DbId>,
    pub directors: Vec<DbId>,
}

impl ContentPatch {
    pub fn relation_ids(&self, kind: RelationKind) -> &[DbId] {
        match kind {
            RelationKind::Country => &self.countries,
            RelationKind::Genre => &self.genres,
            RelationKind::Actor => &self.actors,
            RelationKind::Director => &self.directors,
        }
    }
}

/// Draft for a new content item, relations given by lookup IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewContent {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub original_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 512))]
    pub short_description: String,
    #[validate(range(min = 1800, max = 2100))]
    pub year: i32,
    #[serde(default)]
    pub images: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub countries: Vec<DbId>,
    #[serde(default)]
    pub genres: Vec<DbId>,
    #[serde(default)]
    pub actors: Vec<DbId>,
    #[serde(default)]
    pub directors: Vec<DbId>,
}

impl NewContent {
    pub fn relation_ids(&self, kind: RelationKind) -> &[DbId] {
        match kind {
            RelationKind::Country => &self.countries,
            RelationKind::Genre => &self.genres,
            RelationKind::Actor => &self.actors,
            RelationKind::Director => &self.directors,
        }
    }

    /// Scalar part of the draft as an unsaved `Content` with no relations.
    pub fn to_content(&self) -> Content {
        Content {
            name: self.name.clone(),
            original_name: self.original_name.clone(),
            description: self.description.clone(),
            short_description: self.short_description.clone(),
            year: self.year,
            images: self.images.clone(),
            content_type: self.content_type,
            is_free: self.is_free,
            ..Content::default()
        }
    }
}
