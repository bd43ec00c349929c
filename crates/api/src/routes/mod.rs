pub mod content;
pub mod health;
pub mod lookup;

use axum::Router;
use marquee_core::content::{Actor, Country, Director, Genre};

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /contents    content aggregate, listings, viewer state
/// /countries   lookup CRUD
/// /genres      lookup CRUD
/// /actors      lookup CRUD
/// /directors   lookup CRUD
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/contents", content::router())
        .nest("/countries", lookup::router::<Country>())
        .nest("/genres", lookup::router::<Genre>())
        .nest("/actors", lookup::router::<Actor>())
        .nest("/directors", lookup::router::<Director>())
}
