//! Argument vocabulary for the site query engine.
//!
//! The field names mirror the engine's parameter vocabulary: `*_in` /
//! `*_not_in` list constraints plus single-value variants where the engine
//! treats an empty string as "no constraint" rather than absent.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Sort key accepted by the site query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    Id,
    Domain,
    Path,
    NetworkId,
    LastUpdated,
    Registered,
    DomainLength,
    PathLength,
    /// Preserve the order of the `site__in` id list.
    #[serde(rename = "site__in")]
    SiteIn,
    /// Preserve the order of the `network__in` id list.
    #[serde(rename = "network__in")]
    NetworkIn,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    #[default]
    Desc,
}

/// A single range constraint on the `registered` timestamp.
///
/// The engine requires ranges nested in a list even when only one range is
/// given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateRange {
    pub before: Option<Timestamp>,
    pub after: Option<Timestamp>,
}

/// Argument set for the site query engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteQueryArgs {
    /// Single-value filters; empty string means no constraint.
    pub search: String,
    pub domain: String,
    pub path: String,
    pub lang_id: String,

    /// List filters; an empty list means no constraint.
    pub site_in: Vec<DbId>,
    pub site_not_in: Vec<DbId>,
    pub domain_in: Vec<String>,
    pub domain_not_in: Vec<String>,
    pub path_in: Vec<String>,
    pub path_not_in: Vec<String>,
    pub network_in: Vec<DbId>,
    pub network_not_in: Vec<DbId>,
    pub lang_in: Vec<i64>,
    pub lang_not_in: Vec<i64>,

    /// Status-flag filters; `None` means no constraint.
    pub public: Option<i64>,
    pub archived: Option<i64>,
    pub mature: Option<i64>,
    pub spam: Option<i64>,
    pub deleted: Option<i64>,

    /// Range constraints on `registered`, nested as the engine requires.
    pub date_query: Vec<DateRange>,

    /// Page size; 0 means no limit.
    pub number: u32,
    pub offset: u64,
    pub order: Order,
    pub orderby: OrderBy,

    /// When false the engine also reports the total matching count.
    pub no_found_rows: bool,
    /// Count-only mode: report the total and return no rows.
    pub count: bool,
}

impl Default for SiteQueryArgs {
    fn default() -> Self {
        Self {
            search: String::new(),
            domain: String::new(),
            path: String::new(),
            lang_id: String::new(),
            site_in: Vec::new(),
            site_not_in: Vec::new(),
            domain_in: Vec::new(),
            domain_not_in: Vec::new(),
            path_in: Vec::new(),
            path_not_in: Vec::new(),
            network_in: Vec::new(),
            network_not_in: Vec::new(),
            lang_in: Vec::new(),
            lang_not_in: Vec::new(),
            public: None,
            archived: None,
            mature: None,
            spam: None,
            deleted: None,
            date_query: Vec::new(),
            number: 0,
            offset: 0,
            order: Order::default(),
            orderby: OrderBy::default(),
            // The engine skips the total count unless asked for it.
            no_found_rows: true,
            count: false,
        }
    }
}
