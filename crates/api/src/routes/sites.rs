use axum::routing::get;
use axum::Router;

use crate::handlers::sites;
use crate::state::AppState;

/// Mount the sites resource routes (intended under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/sites",
            get(sites::list_sites)
                .post(sites::create_site)
                .options(sites::describe_collection),
        )
        .route(
            "/sites/{id}",
            get(sites::get_site)
                .put(sites::update_site)
                .patch(sites::update_site)
                .delete(sites::delete_site)
                .options(sites::describe_item),
        )
}
