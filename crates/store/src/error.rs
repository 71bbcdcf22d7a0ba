//! Error type for the storage collaborators.

/// Failure reported by a storage collaborator.
///
/// The API layer wraps these with HTTP status 500 and surfaces
/// [`StoreError::code`] as the wire error code.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A site with the same domain and path already exists in the network.
    #[error("Sorry, that site already exists!")]
    SiteTaken,

    /// The site id does not resolve to a record.
    #[error("Site does not exist.")]
    SiteNotFound,

    /// Prepared data named no domain.
    #[error("Site domain must not be empty.")]
    EmptyDomain,

    /// The named network does not exist.
    #[error("Network does not exist.")]
    NetworkNotFound,

    /// Any other backend failure.
    #[error("Storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Stable error code surfaced to API clients when the failure is
    /// wrapped into an HTTP response.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::SiteTaken => "site_taken",
            StoreError::SiteNotFound => "site_not_exist",
            StoreError::EmptyDomain => "site_empty_domain",
            StoreError::NetworkNotFound => "network_not_exist",
            StoreError::Backend(_) => "site_storage_failure",
        }
    }
}
