//! Repository for per-user content state (`user_favourites`, `user_ratings`).
//!
//! These rows are only ever read through the personalization joins of
//! [`ContentRepo`](super::ContentRepo); this repository owns their writes.

use marquee_core::types::DbId;
use sqlx::PgPool;

/// Provides writes for favourites and like/dislike ratings.
pub struct UserContentRepo;

impl UserContentRepo {
    /// Mark content as a favourite of `user_id` (idempotent).
    pub async fn add_favourite(
        pool: &PgPool,
        user_id: DbId,
        content_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_favourites (user_id, content_id) \
             VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(content_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Returns `true` if a favourite was removed.
    pub async fn remove_favourite(
        pool: &PgPool,
        user_id: DbId,
        content_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM user_favourites WHERE user_id = $1 AND content_id = $2")
                .bind(user_id)
                .bind(content_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a like (`true`) or dislike (`false`), replacing any earlier one.
    pub async fn rate(
        pool: &PgPool,
        user_id: DbId,
        content_id: DbId,
        is_liked: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_ratings (user_id, content_id, is_liked) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, content_id) \
             DO UPDATE SET is_liked = EXCLUDED.is_liked, rated_at = NOW()",
        )
        .bind(user_id)
        .bind(content_id)
        .bind(is_liked)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Returns `true` if a rating was removed.
    pub async fn clear_rating(
        pool: &PgPool,
        user_id: DbId,
        content_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_ratings WHERE user_id = $1 AND content_id = $2")
            .bind(user_id)
            .bind(content_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
