//! Route definitions shared by the four lookup resources.

use axum::routing::get;
use axum::Router;
use marquee_core::content::LookupEntity;
use serde::Serialize;

use crate::handlers::lookup;
use crate::state::AppState;

/// Routes mounted at `/countries`, `/genres`, `/actors` or `/directors`.
///
/// ```text
/// GET    /       -> list
/// POST   /       -> create
/// GET    /{id}   -> get_by_id
/// PUT    /{id}   -> rename
/// DELETE /{id}   -> delete
/// ```
pub fn router<T>() -> Router<AppState>
where
    T: LookupEntity + Serialize,
{
    Router::new()
        .route("/", get(lookup::list::<T>).post(lookup::create::<T>))
        .route(
            "/{id}",
            get(lookup::get_by_id::<T>)
                .put(lookup::rename::<T>)
                .delete(lookup::delete::<T>),
        )
}
