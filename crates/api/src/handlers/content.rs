//! Handlers for the `/contents` resource.
//!
//! Reads and aggregate writes go through [`ContentService`]; favourites and
//! ratings are plain row writes and use `UserContentRepo` directly.
//!
//! [`ContentService`]: marquee_core::service::ContentService

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use marquee_core::content::{ContentPatch, NewContent};
use marquee_core::error::CoreError;
use marquee_core::types::DbId;
use marquee_db::repositories::{ContentRepo, UserContentRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::query::{ContentListParams, PageParams, RequiredViewerParams, ViewerParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /contents/{id}/images`.
#[derive(Debug, Deserialize)]
pub struct UpdateImages {
    pub images: String,
}

/// Request body for `PUT /contents/{id}/rating`.
#[derive(Debug, Deserialize)]
pub struct RateContent {
    pub viewer_id: DbId,
    pub is_liked: bool,
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// GET /api/v1/contents?year=&genre=&country=&actor=&director=&is_free=&content_type=&from=&count=&viewer_id=
pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<ContentListParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = params?;
    let contents = state
        .content
        .list(&params.filter(), params.pagination(), params.viewer())
        .await?;
    Ok(Json(DataResponse { data: contents }))
}

/// GET /api/v1/contents/latest?from=&count=&viewer_id=
pub async fn latest(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = params?;
    let contents = state
        .content
        .latest(params.pagination(), params.viewer())
        .await?;
    Ok(Json(DataResponse { data: contents }))
}

/// GET /api/v1/contents/top-rated?from=&count=&viewer_id=
pub async fn top_rated(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = params?;
    let contents = state
        .content
        .top_rated(params.pagination(), params.viewer())
        .await?;
    Ok(Json(DataResponse { data: contents }))
}

// ---------------------------------------------------------------------------
// Single item
// ---------------------------------------------------------------------------

/// GET /api/v1/contents/{id}?viewer_id=
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    params: Result<Query<ViewerParams>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(params) = params?;
    let content = state.content.get_full_by_id(id, params.viewer()).await?;
    Ok(Json(DataResponse { data: content }))
}

/// POST /api/v1/contents
pub async fn create(
    State(state): State<AppState>,
    input: Result<Json<NewContent>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = input?;
    let content = state.content.create_from_draft(input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: content })))
}

/// PATCH /api/v1/contents/{id}
///
/// Empty strings, a zero year and empty ID lists leave the stored value
/// unchanged.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    input: Result<Json<ContentPatch>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(patch) = input?;
    let content = state.content.update_by_id(id, patch).await?;
    Ok(Json(DataResponse { data: content }))
}

/// PUT /api/v1/contents/{id}/images
pub async fn update_images(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    input: Result<Json<UpdateImages>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = input?;
    if input.images.trim().is_empty() {
        return Err(AppError::BadRequest("images must not be empty".into()));
    }

    let mut content = state.content.get_full_by_id(id, None).await?;
    state
        .content
        .update_posters(&mut content, &input.images)
        .await?;
    Ok(Json(DataResponse { data: content }))
}

/// DELETE /api/v1/contents/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.content.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// PUT /api/v1/contents/{id}/favourite?viewer_id=
pub async fn add_favourite(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    params: Result<Query<RequiredViewerParams>, QueryRejection>,
) -> AppResult<StatusCode> {
    let Query(params) = params?;
    ensure_content_exists(&state, id).await?;
    UserContentRepo::add_favourite(&state.pool, params.viewer_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/contents/{id}/favourite?viewer_id=
pub async fn remove_favourite(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    params: Result<Query<RequiredViewerParams>, QueryRejection>,
) -> AppResult<StatusCode> {
    let Query(params) = params?;
    UserContentRepo::remove_favourite(&state.pool, params.viewer_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/contents/{id}/rating
pub async fn rate(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    input: Result<Json<RateContent>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Json(input) = input?;
    ensure_content_exists(&state, id).await?;
    UserContentRepo::rate(&state.pool, input.viewer_id, id, input.is_liked).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/contents/{id}/rating?viewer_id=
pub async fn clear_rating(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    params: Result<Query<RequiredViewerParams>, QueryRejection>,
) -> AppResult<StatusCode> {
    let Query(params) = params?;
    UserContentRepo::clear_rating(&state.pool, params.viewer_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_content_exists(state: &AppState, id: DbId) -> AppResult<()> {
    ContentRepo::select_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Content",
            id,
        }))?;
    Ok(())
}
