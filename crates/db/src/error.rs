//! Repository error type and the mapping from storage failures to
//! [`CoreError`].

use marquee_core::error::CoreError;
use marquee_core::types::DbId;
use sqlx::{Postgres, Transaction};

/// PostgreSQL SQLSTATE for unique constraint violations.
pub const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for foreign key violations.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Failure of a multi-statement (transactional) repository write.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// The write failed and so did the rollback that followed it.
    #[error("{source}; rollback also failed: {rollback}")]
    Rollback {
        source: sqlx::Error,
        rollback: sqlx::Error,
    },
}

/// Commit `tx` if `result` is `Ok`, roll it back otherwise.
///
/// A successful rollback is logged and the original error is returned. A
/// failed rollback is returned alongside the original error.
pub async fn finish_tx<T>(
    tx: Transaction<'_, Postgres>,
    result: Result<T, sqlx::Error>,
) -> Result<T, RepoError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(source) => match tx.rollback().await {
            Ok(()) => {
                tracing::warn!(error = %source, "Transaction rolled back");
                Err(RepoError::Sqlx(source))
            }
            Err(rollback) => {
                tracing::error!(error = %source, rollback_error = %rollback, "Rollback failed");
                Err(RepoError::Rollback { source, rollback })
            }
        },
    }
}

/// Classify a sqlx error raised while working on `entity` `id`.
///
/// - `RowNotFound` maps to `NotFound`.
/// - Unique violations map to `Conflict`.
/// - Foreign key violations map to `Conflict` (a referenced row is missing, or
///   a row being removed is still referenced).
/// - Everything else maps to `Internal`.
pub fn classify(err: sqlx::Error, entity: &'static str, id: DbId) -> CoreError {
    match err {
        sqlx::Error::RowNotFound => CoreError::NotFound { entity, id },
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => CoreError::Conflict(format!(
                    "{entity} violates unique constraint: {constraint}"
                )),
                Some(FOREIGN_KEY_VIOLATION) => CoreError::Conflict(format!(
                    "{entity} {id} violates foreign key constraint: {constraint}"
                )),
                _ => {
                    tracing::error!(entity, id, error = %db_err, "Database error");
                    CoreError::Internal(format!("Database error: {db_err}"))
                }
            }
        }
        other => {
            tracing::error!(entity, id, error = %other, "Database error");
            CoreError::Internal(format!("Database error: {other}"))
        }
    }
}

/// [`classify`] for transactional writes.
pub fn classify_repo(err: RepoError, entity: &'static str, id: DbId) -> CoreError {
    match err {
        RepoError::Sqlx(err) => classify(err, entity, id),
        err @ RepoError::Rollback { .. } => {
            CoreError::Internal(format!("Database error: {err}"))
        }
    }
}
