//! Storage ports consumed by [`crate::service::ContentService`].
//!
//! Implementations classify their own failures: "no such row" must come back
//! as [`CoreError::NotFound`](crate::error::CoreError::NotFound), never as
//! `Internal`.

use async_trait::async_trait;

use crate::content::{Content, LookupEntity, RelationKind};
use crate::error::CoreResult;
use crate::filter::{ContentFilter, Pagination};
use crate::types::DbId;

/// Transactional persistence of the content aggregate.
///
/// Reads return scalar rows only; relation lists come back as raw IDs through
/// [`ContentStore::select_relation_ids`] and are resolved by the caller.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Insert the row and all four relation sets atomically, writing the
    /// generated key into `content.id`.
    async fn insert(&self, content: &mut Content) -> CoreResult<()>;

    /// Overwrite every scalar column and replace every relation set.
    async fn update(&self, content: &Content) -> CoreResult<()>;

    /// Update only the `images` column.
    async fn update_images(&self, content: &Content) -> CoreResult<()>;

    async fn delete(&self, id: DbId) -> CoreResult<()>;

    /// Scalar row, no personalization.
    async fn select_by_id(&self, id: DbId) -> CoreResult<Content>;

    /// Scalar row with the viewer's overlay applied when `viewer` is set.
    async fn select_full_by_id(&self, id: DbId, viewer: Option<DbId>) -> CoreResult<Content>;

    async fn select_relation_ids(&self, id: DbId, kind: RelationKind) -> CoreResult<Vec<DbId>>;

    async fn select_by_params(
        &self,
        filter: &ContentFilter,
        page: Pagination,
        viewer: Option<DbId>,
    ) -> CoreResult<Vec<Content>>;

    async fn select_latest(&self, page: Pagination, viewer: Option<DbId>)
        -> CoreResult<Vec<Content>>;

    async fn select_by_rating(
        &self,
        page: Pagination,
        viewer: Option<DbId>,
    ) -> CoreResult<Vec<Content>>;
}

/// Read access to one kind of lookup entity.
#[async_trait]
pub trait LookupRepository<T: LookupEntity>: Send + Sync {
    async fn get_by_id(&self, id: DbId) -> CoreResult<T>;

    /// Resolve every ID in order. The first failing lookup fails the call;
    /// there is no partial result.
    async fn list_by_id(&self, ids: &[DbId]) -> CoreResult<Vec<T>> {
        let mut entities = Vec::with_capacity(ids.len());
        for &id in ids {
            entities.push(self.get_by_id(id).await?);
        }
        Ok(entities)
    }
}
