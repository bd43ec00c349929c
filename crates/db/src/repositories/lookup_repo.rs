//! Repository for the lookup tables (`countries`, `genres`, `actors`,
//! `directors`).
//!
//! All four tables share the `{id, name}` shape, so one generic repository
//! serves them; the table name comes from the entity's [`RelationKind`].
//!
//! [`RelationKind`]: marquee_core::content::RelationKind

use marquee_core::content::LookupEntity;
use marquee_core::types::DbId;
use sqlx::PgPool;

use crate::models::lookup::LookupRow;

/// Provides CRUD operations for lookup entities of any kind.
pub struct LookupRepo;

impl LookupRepo {
    /// Insert a new entity, returning it with its generated ID.
    pub async fn create<T: LookupEntity>(pool: &PgPool, name: &str) -> Result<T, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} (name) VALUES ($1) RETURNING id, name",
            T::KIND.lookup_table()
        );
        sqlx::query_as::<_, LookupRow>(&query)
            .bind(name)
            .fetch_one(pool)
            .await
            .map(LookupRow::into_entity)
    }

    pub async fn find_by_id<T: LookupEntity>(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<T>, sqlx::Error> {
        let query = format!(
            "SELECT id, name FROM {} WHERE id = $1",
            T::KIND.lookup_table()
        );
        let row = sqlx::query_as::<_, LookupRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(LookupRow::into_entity))
    }

    /// Find an entity by its unique name.
    pub async fn find_by_name<T: LookupEntity>(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<T>, sqlx::Error> {
        let query = format!(
            "SELECT id, name FROM {} WHERE name = $1",
            T::KIND.lookup_table()
        );
        let row = sqlx::query_as::<_, LookupRow>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(LookupRow::into_entity))
    }

    /// List all entities of a kind, ordered by name ascending.
    pub async fn list<T: LookupEntity>(pool: &PgPool) -> Result<Vec<T>, sqlx::Error> {
        let query = format!(
            "SELECT id, name FROM {} ORDER BY name ASC",
            T::KIND.lookup_table()
        );
        let rows = sqlx::query_as::<_, LookupRow>(&query)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(LookupRow::into_entity).collect())
    }

    /// Rename an entity. Returns `None` if no row with the given `id` exists.
    pub async fn rename<T: LookupEntity>(
        pool: &PgPool,
        id: DbId,
        name: &str,
    ) -> Result<Option<T>, sqlx::Error> {
        let query = format!(
            "UPDATE {} SET name = $2 WHERE id = $1 RETURNING id, name",
            T::KIND.lookup_table()
        );
        let row = sqlx::query_as::<_, LookupRow>(&query)
            .bind(id)
            .bind(name)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(LookupRow::into_entity))
    }

    /// Permanently delete an entity. Returns `true` if a row was removed.
    ///
    /// Fails with a foreign key violation while any content still links to it.
    pub async fn delete<T: LookupEntity>(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!("DELETE FROM {} WHERE id = $1", T::KIND.lookup_table());
        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
