pub mod health;
pub mod sites;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sites          list, create, describe (GET, POST, OPTIONS)
/// /sites/{id}     read, update, delete, describe
///                 (GET, PUT, PATCH, DELETE, OPTIONS)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(sites::router())
}
