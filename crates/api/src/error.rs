//! Application-level error type for HTTP handlers.
//!
//! Every failure surfaces as a (code, human message, HTTP status) triple,
//! serialized as `{"code": ..., "message": ..., "data": {"status": N}}`.
//! Extension-point errors propagate unchanged; storage failures are
//! wrapped with status 500 and keep the collaborator's own code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sitenet_core::hooks::HookError;
use sitenet_store::StoreError;

/// Error returned by the sites handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The id does not resolve to a site (404 `rest_site_invalid_id`).
    #[error("Invalid site ID.")]
    InvalidSiteId,

    /// A create request carried an id (400 `rest_site_exists`).
    #[error("Cannot create existing site.")]
    SiteExists,

    /// The named network does not exist (400 `rest_network_id_invalid`).
    #[error("Invalid network ID.")]
    InvalidNetworkId,

    /// Caller lacks the capability for the requested context
    /// (403 `rest_forbidden_context`).
    #[error("Sorry, you are not allowed to edit sites.")]
    ForbiddenContext,

    /// Caller may not edit this site (403 `rest_cannot_edit`).
    #[error("Sorry, you are not allowed to edit this site.")]
    CannotEdit,

    /// Caller may not delete this site (403 `rest_cannot_delete`).
    #[error("Sorry, you are not allowed to delete this site.")]
    CannotDelete,

    /// Caller lacks the capability for the operation (403 `rest_forbidden`).
    #[error("Sorry, you are not allowed to do that.")]
    Forbidden,

    /// Missing or invalid credentials (401 `rest_not_logged_in`).
    #[error("{0}")]
    NotLoggedIn(String),

    /// A request value failed validation (400 `rest_invalid_param`).
    #[error("{0}")]
    InvalidParam(String),

    /// An extension point short-circuited the pipeline; propagated as-is.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// Upstream persistence failure, wrapped with status 500.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn triple(&self) -> (StatusCode, String, String) {
        match self {
            ApiError::InvalidSiteId => (
                StatusCode::NOT_FOUND,
                "rest_site_invalid_id".into(),
                self.to_string(),
            ),
            ApiError::SiteExists => (
                StatusCode::BAD_REQUEST,
                "rest_site_exists".into(),
                self.to_string(),
            ),
            ApiError::InvalidNetworkId => (
                StatusCode::BAD_REQUEST,
                "rest_network_id_invalid".into(),
                self.to_string(),
            ),
            ApiError::ForbiddenContext => (
                StatusCode::FORBIDDEN,
                "rest_forbidden_context".into(),
                self.to_string(),
            ),
            ApiError::CannotEdit => (
                StatusCode::FORBIDDEN,
                "rest_cannot_edit".into(),
                self.to_string(),
            ),
            ApiError::CannotDelete => (
                StatusCode::FORBIDDEN,
                "rest_cannot_delete".into(),
                self.to_string(),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "rest_forbidden".into(),
                self.to_string(),
            ),
            ApiError::NotLoggedIn(msg) => (
                StatusCode::UNAUTHORIZED,
                "rest_not_logged_in".into(),
                msg.clone(),
            ),
            ApiError::InvalidParam(msg) => (
                StatusCode::BAD_REQUEST,
                "rest_invalid_param".into(),
                msg.clone(),
            ),
            ApiError::Hook(err) => (
                StatusCode::from_u16(err.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                err.code.clone(),
                err.message.clone(),
            ),
            ApiError::Store(err) => {
                tracing::error!(error = %err, "storage collaborator failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.code().into(),
                    err.to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.triple();

        let body = json!({
            "code": code,
            "message": message,
            "data": { "status": status.as_u16() },
        });

        (status, axum::Json(body)).into_response()
    }
}
