//! Postgres implementations of the `marquee_core` ports.
//!
//! Each store delegates to a repository, bounds the call with a deadline and
//! classifies the outcome into [`CoreError`]. A call that misses its deadline
//! is dropped mid-flight, which drops any open transaction and rolls it back.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use marquee_core::content::{
    Actor, Content, Country, Director, Genre, LookupEntity, RelationKind,
};
use marquee_core::error::{CoreError, CoreResult};
use marquee_core::filter::{ContentFilter, Pagination};
use marquee_core::ports::{ContentStore, LookupRepository};
use marquee_core::service::{ContentService, Lookups};
use marquee_core::types::DbId;

use crate::error::{classify, classify_repo};
use crate::repositories::{ContentRepo, LookupRepo};
use crate::DbPool;

/// Entity name reported for content errors.
const CONTENT: &str = "Content";

/// Default per-operation deadline.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `fut` under `timeout`, turning an elapsed deadline into `Internal`.
async fn with_deadline<T, F>(op: &'static str, timeout: Duration, fut: F) -> CoreResult<T>
where
    F: Future<Output = CoreResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(op, timeout_ms = timeout.as_millis() as u64, "Store operation timed out");
            Err(CoreError::Internal(format!(
                "{op} timed out after {}ms",
                timeout.as_millis()
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct PgContentStore {
    pool: DbPool,
    op_timeout: Duration,
}

impl PgContentStore {
    pub fn new(pool: DbPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn insert(&self, content: &mut Content) -> CoreResult<()> {
        with_deadline("content.insert", self.op_timeout, async {
            ContentRepo::insert(self.pool(), content)
                .await
                .map_err(|e| classify_repo(e, CONTENT, 0))
        })
        .await
    }

    async fn update(&self, content: &Content) -> CoreResult<()> {
        let id = content.id;
        with_deadline("content.update", self.op_timeout, async {
            match ContentRepo::update(self.pool(), content).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(CoreError::NotFound {
                    entity: CONTENT,
                    id,
                }),
                Err(e) => Err(classify_repo(e, CONTENT, id)),
            }
        })
        .await
    }

    async fn update_images(&self, content: &Content) -> CoreResult<()> {
        let id = content.id;
        with_deadline("content.update_images", self.op_timeout, async {
            match ContentRepo::update_images(self.pool(), content).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(CoreError::NotFound {
                    entity: CONTENT,
                    id,
                }),
                Err(e) => Err(classify(e, CONTENT, id)),
            }
        })
        .await
    }

    async fn delete(&self, id: DbId) -> CoreResult<()> {
        with_deadline("content.delete", self.op_timeout, async {
            match ContentRepo::delete(self.pool(), id).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(CoreError::NotFound {
                    entity: CONTENT,
                    id,
                }),
                Err(e) => Err(classify(e, CONTENT, id)),
            }
        })
        .await
    }

    async fn select_by_id(&self, id: DbId) -> CoreResult<Content> {
        with_deadline("content.select_by_id", self.op_timeout, async {
            ContentRepo::select_by_id(self.pool(), id)
                .await
                .map_err(|e| classify(e, CONTENT, id))?
                .ok_or(CoreError::NotFound {
                    entity: CONTENT,
                    id,
                })
        })
        .await
    }

    async fn select_full_by_id(&self, id: DbId, viewer: Option<DbId>) -> CoreResult<Content> {
        with_deadline("content.select_full_by_id", self.op_timeout, async {
            ContentRepo::select_full_by_id(self.pool(), id, viewer)
                .await
                .map_err(|e| classify(e, CONTENT, id))?
                .ok_or(CoreError::NotFound {
                    entity: CONTENT,
                    id,
                })
        })
        .await
    }

    async fn select_relation_ids(&self, id: DbId, kind: RelationKind) -> CoreResult<Vec<DbId>> {
        with_deadline("content.select_relation_ids", self.op_timeout, async {
            ContentRepo::select_relation_ids(self.pool(), id, kind)
                .await
                .map_err(|e| classify(e, CONTENT, id))
        })
        .await
    }

    async fn select_by_params(
        &self,
        filter: &ContentFilter,
        page: Pagination,
        viewer: Option<DbId>,
    ) -> CoreResult<Vec<Content>> {
        with_deadline("content.select_by_params", self.op_timeout, async {
            ContentRepo::select_by_params(self.pool(), filter, page, viewer)
                .await
                .map_err(|e| classify(e, CONTENT, 0))
        })
        .await
    }

    async fn select_latest(
        &self,
        page: Pagination,
        viewer: Option<DbId>,
    ) -> CoreResult<Vec<Content>> {
        with_deadline("content.select_latest", self.op_timeout, async {
            ContentRepo::select_latest(self.pool(), page, viewer)
                .await
                .map_err(|e| classify(e, CONTENT, 0))
        })
        .await
    }

    async fn select_by_rating(
        &self,
        page: Pagination,
        viewer: Option<DbId>,
    ) -> CoreResult<Vec<Content>> {
        with_deadline("content.select_by_rating", self.op_timeout, async {
            ContentRepo::select_by_rating(self.pool(), page, viewer)
                .await
                .map_err(|e| classify(e, CONTENT, 0))
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Lookup port for one entity kind, backed by its reference table.
#[derive(Debug)]
pub struct PgLookupStore<T> {
    pool: DbPool,
    op_timeout: Duration,
    _kind: PhantomData<fn() -> T>,
}

impl<T> PgLookupStore<T> {
    pub fn new(pool: DbPool, op_timeout: Duration) -> Self {
        Self {
            pool,
            op_timeout,
            _kind: PhantomData,
        }
    }
}

impl<T> Clone for PgLookupStore<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone(), self.op_timeout)
    }
}

#[async_trait]
impl<T: LookupEntity> LookupRepository<T> for PgLookupStore<T> {
    async fn get_by_id(&self, id: DbId) -> CoreResult<T> {
        let entity = T::KIND.entity_name();
        with_deadline("lookup.get_by_id", self.op_timeout, async {
            LookupRepo::find_by_id::<T>(&self.pool, id)
                .await
                .map_err(|e| classify(e, entity, id))?
                .ok_or(CoreError::NotFound { entity, id })
        })
        .await
    }
}

/// Postgres-backed lookup ports for all four relation kinds.
pub fn pg_lookups(pool: &DbPool, op_timeout: Duration) -> Lookups {
    Lookups {
        countries: Arc::new(PgLookupStore::<Country>::new(pool.clone(), op_timeout)),
        genres: Arc::new(PgLookupStore::<Genre>::new(pool.clone(), op_timeout)),
        actors: Arc::new(PgLookupStore::<Actor>::new(pool.clone(), op_timeout)),
        directors: Arc::new(PgLookupStore::<Director>::new(pool.clone(), op_timeout)),
    }
}

/// A [`ContentService`] wired to Postgres.
pub fn content_service(pool: &DbPool, op_timeout: Duration) -> ContentService {
    ContentService::new(
        Arc::new(PgContentStore::new(pool.clone(), op_timeout)),
        pg_lookups(pool, op_timeout),
    )
}
