//! Route definitions for the content aggregate.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::content;
use crate::state::AppState;

/// Routes mounted at `/contents`.
///
/// ```text
/// GET    /                 -> list (filtered)
/// POST   /                 -> create
/// GET    /latest           -> latest
/// GET    /top-rated        -> top_rated
/// GET    /{id}             -> get_by_id
/// PATCH  /{id}             -> update
/// DELETE /{id}             -> delete
/// PUT    /{id}/images      -> update_images
/// PUT    /{id}/favourite   -> add_favourite
/// DELETE /{id}/favourite   -> remove_favourite
/// PUT    /{id}/rating      -> rate
/// DELETE /{id}/rating      -> clear_rating
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(content::list).post(content::create))
        .route("/latest", get(content::latest))
        .route("/top-rated", get(content::top_rated))
        .route(
            "/{id}",
            get(content::get_by_id)
                .patch(content::update)
                .delete(content::delete),
        )
        .route("/{id}/images", put(content::update_images))
        .route(
            "/{id}/favourite",
            put(content::add_favourite).delete(content::remove_favourite),
        )
        .route(
            "/{id}/rating",
            put(content::rate).delete(content::clear_rating),
        )
}
