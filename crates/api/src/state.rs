use std::sync::Arc;

use marquee_core::service::ContentService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool and the service are reference counted inside.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, for handlers that call repositories directly.
    pub pool: marquee_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Content usecase wired to the Postgres stores.
    pub content: ContentService,
}

impl AppState {
    pub fn new(pool: marquee_db::DbPool, config: ServerConfig) -> Self {
        let content = marquee_db::stores::content_service(&pool, config.db_op_timeout());
        Self {
            pool,
            config: Arc::new(config),
            content,
        }
    }
}
