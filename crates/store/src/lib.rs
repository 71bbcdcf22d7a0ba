//! Storage collaborators for the sites API.
//!
//! The HTTP controller talks to storage exclusively through the
//! [`SiteStore`] and [`SiteMetaStore`] traits. [`MemoryStore`] and
//! [`MemoryMetaStore`] are the reference engines behind those traits,
//! used by the dev server and the test suite.

pub mod error;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use sitenet_core::query::SiteQueryArgs;
use sitenet_core::site::{Site, SiteData};
use sitenet_core::types::DbId;

pub use error::StoreError;
pub use memory::{MemoryMetaStore, MemoryStore};

/// Result of one query-engine execution.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// The page of matching sites, in query order. Empty in count mode.
    pub sites: Vec<Site>,
    /// Total matching rows. In a limited query this is only populated when
    /// `no_found_rows` is false, and reports 0 when the requested page is
    /// empty.
    pub found: u64,
    /// `ceil(found / number)`; 0 when unlimited or nothing was found.
    pub max_num_pages: u32,
}

/// Query/persistence collaborator for site records.
#[async_trait]
pub trait SiteStore: Send + Sync {
    /// Execute a site query.
    async fn query(&self, args: &SiteQueryArgs) -> Result<QueryResult, StoreError>;

    /// Look up a single site by id.
    async fn get_site(&self, id: DbId) -> Result<Option<Site>, StoreError>;

    /// Create a site from prepared data, returning the stored record.
    async fn insert_site(&self, data: &SiteData) -> Result<Site, StoreError>;

    /// Apply prepared data to an existing site; `None` fields are left
    /// unchanged.
    async fn update_site(&self, id: DbId, data: &SiteData) -> Result<Site, StoreError>;

    /// Remove a site, returning the record as it was before deletion.
    async fn delete_site(&self, id: DbId) -> Result<Site, StoreError>;

    /// Whether a network with this id exists.
    async fn network_exists(&self, id: DbId) -> Result<bool, StoreError>;

    /// Cheap reachability probe for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Keyed metadata collaborator for site records.
#[async_trait]
pub trait SiteMetaStore: Send + Sync {
    /// All metadata stored for a site. Missing sites yield an empty map.
    async fn get(&self, site_id: DbId) -> Result<BTreeMap<String, serde_json::Value>, StoreError>;

    /// Store one metadata value.
    async fn set(
        &self,
        site_id: DbId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Drop all metadata for a site.
    async fn purge(&self, site_id: DbId) -> Result<(), StoreError>;
}
