//! Domain types and contracts for the sitenet multisite platform.
//!
//! This crate holds the pieces shared by the storage layer and the HTTP
//! controller: the site entity and its prepared-data shape, the query-engine
//! argument vocabulary, the capability model, and the extension-point
//! registry. No I/O happens here.

pub mod capability;
pub mod hooks;
pub mod meta;
pub mod query;
pub mod site;
pub mod types;
