use std::sync::Arc;

use sitenet_core::capability::Authorizer;
use sitenet_core::hooks::Hooks;
use sitenet_core::meta::MetaRegistry;
use sitenet_store::{SiteMetaStore, SiteStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (all collaborators live behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Site query/persistence collaborator.
    pub store: Arc<dyn SiteStore>,
    /// Site metadata collaborator.
    pub meta: Arc<dyn SiteMetaStore>,
    /// Permission predicate collaborator.
    pub authorizer: Arc<dyn Authorizer>,
    /// Registered extension points.
    pub hooks: Arc<Hooks>,
    /// Metadata fields exposed through the API.
    pub meta_registry: Arc<MetaRegistry>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
