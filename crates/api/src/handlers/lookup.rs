//! Handlers for the lookup resources (`/countries`, `/genres`, `/actors`,
//! `/directors`).
//!
//! One generic set of handlers serves all four kinds; the route module picks
//! the entity type.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use marquee_core::content::LookupEntity;
use marquee_core::error::CoreError;
use marquee_core::types::DbId;
use marquee_db::repositories::LookupRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Longest accepted lookup name.
const MAX_NAME_LEN: usize = 255;

/// Request body for create and rename.
#[derive(Debug, Deserialize)]
pub struct LookupInput {
    pub name: String,
}

impl LookupInput {
    fn validated_name(&self) -> AppResult<&str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "name must not be empty".into(),
            )));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::Core(CoreError::Validation(format!(
                "name must be at most {MAX_NAME_LEN} characters"
            ))));
        }
        Ok(name)
    }
}

fn not_found<T: LookupEntity>(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: T::KIND.entity_name(),
        id,
    })
}

/// GET /api/v1/{kind}
pub async fn list<T>(State(state): State<AppState>) -> AppResult<impl IntoResponse>
where
    T: LookupEntity + Serialize,
{
    let items = LookupRepo::list::<T>(&state.pool).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/{kind}/{id}
pub async fn get_by_id<T>(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse>
where
    T: LookupEntity + Serialize,
{
    let item = LookupRepo::find_by_id::<T>(&state.pool, id)
        .await?
        .ok_or_else(|| not_found::<T>(id))?;
    Ok(Json(DataResponse { data: item }))
}

/// POST /api/v1/{kind}
pub async fn create<T>(
    State(state): State<AppState>,
    input: Result<Json<LookupInput>, JsonRejection>,
) -> AppResult<impl IntoResponse>
where
    T: LookupEntity + Serialize,
{
    let Json(input) = input?;
    let item = LookupRepo::create::<T>(&state.pool, input.validated_name()?).await?;
    tracing::info!(kind = T::KIND.entity_name(), id = item.id(), "Lookup entity created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}

/// PUT /api/v1/{kind}/{id}
pub async fn rename<T>(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    input: Result<Json<LookupInput>, JsonRejection>,
) -> AppResult<impl IntoResponse>
where
    T: LookupEntity + Serialize,
{
    let Json(input) = input?;
    let item = LookupRepo::rename::<T>(&state.pool, id, input.validated_name()?)
        .await?
        .ok_or_else(|| not_found::<T>(id))?;
    Ok(Json(DataResponse { data: item }))
}

/// DELETE /api/v1/{kind}/{id}
///
/// Answers 409 while any content still links to the entity.
pub async fn delete<T>(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode>
where
    T: LookupEntity,
{
    if !LookupRepo::delete::<T>(&state.pool, id).await? {
        return Err(not_found::<T>(id));
    }
    tracing::info!(kind = T::KIND.entity_name(), id, "Lookup entity deleted");
    Ok(StatusCode::NO_CONTENT)
}
