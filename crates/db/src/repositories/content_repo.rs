//! Repository for the `content` table and its four relation tables
//! (`content_country`, `content_genre`, `content_actor`, `content_director`).
//!
//! Writes touch the content row and every relation set inside one
//! transaction. Reads return scalar rows and raw relation ID lists; resolving
//! IDs into lookup entities is the usecase's job.

use marquee_core::content::{unique_ids, Content, RelationKind};
use marquee_core::filter::{ContentFilter, Pagination};
use marquee_core::types::{DbId, Timestamp};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{finish_tx, RepoError};
use crate::filter_query::{
    bind_params, build_filter, build_pagination, build_personalization, SqlParam,
};
use crate::models::content::ContentRow;

/// Scalar columns of `content c`, shared across reads.
const COLUMNS: &str = "c.id, c.name, c.original_name, c.description, c.short_description, \
     c.year, c.images, c.content_type, c.is_free, c.created_at";

/// Provides transactional writes and personalized reads of content.
pub struct ContentRepo;

impl ContentRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert the content row and all relation sets in one transaction.
    ///
    /// On success the generated `id` and `created_at` are written back into
    /// `content`. Nothing is visible, and `content` is untouched, on failure.
    pub async fn insert(pool: &PgPool, content: &mut Content) -> Result<(), RepoError> {
        let mut tx = pool.begin().await?;
        let result = Self::insert_inner(&mut tx, content).await;
        let (id, created_at) = finish_tx(tx, result).await?;

        content.id = id;
        content.created_at = Some(created_at);
        tracing::debug!(content_id = id, "Inserted content aggregate");
        Ok(())
    }

    /// Overwrite every scalar column and replace every relation set.
    ///
    /// The content row is locked first so concurrent updates of the same
    /// content apply their delete+insert sequences one after the other.
    /// Returns `false` if no row with `content.id` exists.
    pub async fn update(pool: &PgPool, content: &Content) -> Result<bool, RepoError> {
        let mut tx = pool.begin().await?;
        let result = Self::update_inner(&mut tx, content).await;
        let updated = finish_tx(tx, result).await?;

        if updated {
            tracing::debug!(content_id = content.id, "Updated content aggregate");
        }
        Ok(updated)
    }

    /// Update only the `images` column. Returns `false` if the row is missing.
    pub async fn update_images(pool: &PgPool, content: &Content) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE content SET images = $2 WHERE id = $1")
            .bind(content.id)
            .bind(&content.images)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a content row; relation and viewer rows cascade.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM content WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Scalar reads
    // -----------------------------------------------------------------------

    /// Find a content row by ID. Relations are not loaded and the viewer
    /// overlay columns are `None`.
    pub async fn select_by_id(pool: &PgPool, id: DbId) -> Result<Option<Content>, sqlx::Error> {
        Self::select_full_by_id(pool, id, None).await
    }

    /// Find a content row by ID with the viewer overlay applied when `viewer`
    /// is set.
    pub async fn select_full_by_id(
        pool: &PgPool,
        id: DbId,
        viewer: Option<DbId>,
    ) -> Result<Option<Content>, sqlx::Error> {
        let mut params = vec![SqlParam::BigInt(id)];
        let personal = build_personalization(&mut params, viewer);
        let query = format!(
            "SELECT {COLUMNS}, {projection} FROM content c{joins} WHERE c.id = $1",
            projection = personal.projection,
            joins = personal.joins,
        );

        let row = bind_params(sqlx::query_as::<_, ContentRow>(&query), &params)
            .fetch_optional(pool)
            .await?;
        row.map(ContentRow::into_content).transpose()
    }

    // -----------------------------------------------------------------------
    // Relation reads
    // -----------------------------------------------------------------------

    /// IDs linked to `content_id` through the `kind` pair table, ascending.
    pub async fn select_relation_ids(
        pool: &PgPool,
        content_id: DbId,
        kind: RelationKind,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let query = format!(
            "SELECT {column} FROM {table} WHERE content_id = $1 ORDER BY {column}",
            column = kind.entity_column(),
            table = kind.join_table(),
        );
        sqlx::query_scalar::<_, DbId>(&query)
            .bind(content_id)
            .fetch_all(pool)
            .await
    }

    pub async fn select_countries_by_id(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        Self::select_relation_ids(pool, content_id, RelationKind::Country).await
    }

    pub async fn select_genres_by_id(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        Self::select_relation_ids(pool, content_id, RelationKind::Genre).await
    }

    pub async fn select_actors_by_id(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        Self::select_relation_ids(pool, content_id, RelationKind::Actor).await
    }

    pub async fn select_directors_by_id(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        Self::select_relation_ids(pool, content_id, RelationKind::Director).await
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// Filtered listing, newest release year first.
    pub async fn select_by_params(
        pool: &PgPool,
        filter: &ContentFilter,
        page: Pagination,
        viewer: Option<DbId>,
    ) -> Result<Vec<Content>, sqlx::Error> {
        let mut params = Vec::new();
        let personal = build_personalization(&mut params, viewer);
        let clause = build_filter(&mut params, filter);
        let window = build_pagination(&mut params, page);

        let query = format!(
            "SELECT {COLUMNS}, {projection} FROM content c{filter_joins}{personal_joins}{where_clause} \
             ORDER BY c.year DESC, c.id DESC{window}",
            projection = personal.projection,
            filter_joins = clause.joins,
            personal_joins = personal.joins,
            where_clause = clause.where_clause,
        );
        Self::fetch_rows(pool, &query, &params).await
    }

    /// Most recently added content first.
    pub async fn select_latest(
        pool: &PgPool,
        page: Pagination,
        viewer: Option<DbId>,
    ) -> Result<Vec<Content>, sqlx::Error> {
        let mut params = Vec::new();
        let personal = build_personalization(&mut params, viewer);
        let window = build_pagination(&mut params, page);

        let query = format!(
            "SELECT {COLUMNS}, {projection} FROM content c{joins} \
             ORDER BY c.created_at DESC, c.id DESC{window}",
            projection = personal.projection,
            joins = personal.joins,
        );
        Self::fetch_rows(pool, &query, &params).await
    }

    /// Content ordered by like score (likes minus dislikes), best first.
    /// Unrated content scores zero.
    pub async fn select_by_rating(
        pool: &PgPool,
        page: Pagination,
        viewer: Option<DbId>,
    ) -> Result<Vec<Content>, sqlx::Error> {
        let mut params = Vec::new();
        let personal = build_personalization(&mut params, viewer);
        let window = build_pagination(&mut params, page);

        let query = format!(
            "SELECT {COLUMNS}, {projection} FROM content c \
             LEFT OUTER JOIN ( \
                 SELECT content_id, \
                        COUNT(*) FILTER (WHERE is_liked) - COUNT(*) FILTER (WHERE NOT is_liked) AS score \
                 FROM user_ratings GROUP BY content_id \
             ) rs ON rs.content_id = c.id{joins} \
             ORDER BY COALESCE(rs.score, 0) DESC, c.id DESC{window}",
            projection = personal.projection,
            joins = personal.joins,
        );
        Self::fetch_rows(pool, &query, &params).await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn fetch_rows(
        pool: &PgPool,
        query: &str,
        params: &[SqlParam],
    ) -> Result<Vec<Content>, sqlx::Error> {
        bind_params(sqlx::query_as::<_, ContentRow>(query), params)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(ContentRow::into_content)
            .collect()
    }

    async fn insert_inner(
        tx: &mut Transaction<'_, Postgres>,
        content: &Content,
    ) -> Result<(DbId, Timestamp), sqlx::Error> {
        let (id, created_at) = sqlx::query_as::<_, (DbId, Timestamp)>(
            "INSERT INTO content \
                (name, original_name, description, short_description, year, images, \
                 content_type, is_free) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, created_at",
        )
        .bind(&content.name)
        .bind(&content.original_name)
        .bind(&content.description)
        .bind(&content.short_description)
        .bind(content.year)
        .bind(&content.images)
        .bind(content.content_type.as_str())
        .bind(content.is_free)
        .fetch_one(&mut **tx)
        .await?;

        for kind in RelationKind::ALL {
            Self::insert_relations(tx, id, kind, &content.relation_ids(kind)).await?;
        }
        Ok((id, created_at))
    }

    async fn update_inner(
        tx: &mut Transaction<'_, Postgres>,
        content: &Content,
    ) -> Result<bool, sqlx::Error> {
        let locked = sqlx::query_scalar::<_, DbId>("SELECT id FROM content WHERE id = $1 FOR UPDATE")
            .bind(content.id)
            .fetch_optional(&mut **tx)
            .await?;
        if locked.is_none() {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE content SET \
                name = $2, \
                original_name = $3, \
                description = $4, \
                short_description = $5, \
                year = $6, \
                images = $7, \
                content_type = $8, \
                is_free = $9 \
             WHERE id = $1",
        )
        .bind(content.id)
        .bind(&content.name)
        .bind(&content.original_name)
        .bind(&content.description)
        .bind(&content.short_description)
        .bind(content.year)
        .bind(&content.images)
        .bind(content.content_type.as_str())
        .bind(content.is_free)
        .execute(&mut **tx)
        .await?;

        for kind in RelationKind::ALL {
            Self::replace_relations(tx, content.id, kind, &content.relation_ids(kind)).await?;
        }
        Ok(true)
    }

    /// Replace the `kind` relation set within an existing transaction.
    ///
    /// Deletes existing rows, then inserts the new set.
    async fn replace_relations(
        tx: &mut Transaction<'_, Postgres>,
        content_id: DbId,
        kind: RelationKind,
        entity_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let query = format!("DELETE FROM {} WHERE content_id = $1", kind.join_table());
        sqlx::query(&query)
            .bind(content_id)
            .execute(&mut **tx)
            .await?;

        Self::insert_relations(tx, content_id, kind, entity_ids).await
    }

    /// Bulk-insert `(content_id, entity_id)` pairs with a single UNNEST
    /// statement. Duplicate IDs are dropped first.
    async fn insert_relations(
        tx: &mut Transaction<'_, Postgres>,
        content_id: DbId,
        kind: RelationKind,
        entity_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let entity_ids = unique_ids(entity_ids);
        if entity_ids.is_empty() {
            return Ok(());
        }

        let query = format!(
            "INSERT INTO {table} (content_id, {column}) \
             SELECT $1, UNNEST($2::BIGINT[])",
            table = kind.join_table(),
            column = kind.entity_column(),
        );
        sqlx::query(&query)
            .bind(content_id)
            .bind(&entity_ids)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
