//! Collection query parameters and their translation to engine arguments.
//!
//! Public parameter names map onto the query engine's vocabulary
//! (`domain` -> `domain__in`, `exclude` -> `site__not_in`, `per_page` ->
//! `number`, ...). Translation happens in [`build_query_args`]; the typed
//! [`SiteQueryArgs`] fields carry the engine-side names.

use serde::{Deserialize, Deserializer, Serialize};
use sitenet_core::query::{DateRange, Order, OrderBy, SiteQueryArgs};
use sitenet_core::types::{DbId, Timestamp};
use url::form_urlencoded;

use crate::error::ApiError;

/// Representation context requested by the client.
///
/// `embed` omits the display attributes (`blogname`, `siteurl`, `home`,
/// `post_count`); `edit` is only available to site managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    #[default]
    View,
    Embed,
    Edit,
}

/// Default page size for collection listings.
pub const DEFAULT_PER_PAGE: u32 = 10;
/// Largest accepted page size.
pub const MAX_PER_PAGE: u32 = 100;

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

/// Deserialize a comma-separated list of integers (`?include=1,2,3`).
fn csv_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<i64>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().map_err(serde::de::Error::custom))
        .collect()
}

/// Deserialize a comma-separated list of strings (`?domain=a.org,b.org`).
fn csv_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect())
}

/// Query parameters recognized by the collection listing.
///
/// Values are validated by deserialization (enums, integers, timestamps);
/// range checks happen in [`SiteListParams::check_ranges`]. Everything
/// downstream assumes well-typed input.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteListParams {
    #[serde(default)]
    pub context: Context,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "csv_strings")]
    pub domain: Vec<String>,
    #[serde(default, deserialize_with = "csv_strings")]
    pub domain_exclude: Vec<String>,
    #[serde(default, deserialize_with = "csv_ids")]
    pub exclude: Vec<DbId>,
    #[serde(default, deserialize_with = "csv_ids")]
    pub include: Vec<DbId>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub order: Order,
    #[serde(default)]
    pub orderby: OrderBy,
    #[serde(default, deserialize_with = "csv_ids")]
    pub network: Vec<DbId>,
    #[serde(default, deserialize_with = "csv_ids")]
    pub network_exclude: Vec<DbId>,
    #[serde(default, deserialize_with = "csv_strings")]
    pub path: Vec<String>,
    #[serde(default, deserialize_with = "csv_strings")]
    pub path_exclude: Vec<String>,
    #[serde(default)]
    pub public: Option<i64>,
    #[serde(default)]
    pub archived: Option<i64>,
    #[serde(default)]
    pub mature: Option<i64>,
    #[serde(default)]
    pub spam: Option<i64>,
    #[serde(default)]
    pub deleted: Option<i64>,
    #[serde(default, deserialize_with = "csv_ids")]
    pub lang_id: Vec<i64>,
    #[serde(default, deserialize_with = "csv_ids")]
    pub lang_id_exclude: Vec<i64>,
    #[serde(default)]
    pub before: Option<Timestamp>,
    #[serde(default)]
    pub after: Option<Timestamp>,
}

impl SiteListParams {
    /// Range checks the schema declares for the pagination parameters.
    pub fn check_ranges(&self) -> Result<(), ApiError> {
        if self.page < 1 {
            return Err(ApiError::InvalidParam("page must be at least 1".into()));
        }
        if self.per_page < 1 || self.per_page > MAX_PER_PAGE {
            return Err(ApiError::InvalidParam(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}"
            )));
        }
        Ok(())
    }
}

/// Translate the public collection parameters into the engine's argument
/// set.
///
/// Single-value string filters left untouched keep their empty-string
/// default, which the engine reads as "no constraint". The total count is
/// always requested so the pagination headers can be built, and the date
/// range lands nested in a one-element list as the engine requires. An
/// explicit `offset` wins over the page-derived one; `offset=0` counts as
/// unset.
pub fn build_query_args(params: &SiteListParams) -> SiteQueryArgs {
    let mut args = SiteQueryArgs {
        domain_in: params.domain.clone(),
        domain_not_in: params.domain_exclude.clone(),
        site_not_in: params.exclude.clone(),
        site_in: params.include.clone(),
        order: params.order,
        network_in: params.network.clone(),
        network_not_in: params.network_exclude.clone(),
        number: params.per_page,
        path_in: params.path.clone(),
        path_not_in: params.path_exclude.clone(),
        public: params.public,
        archived: params.archived,
        mature: params.mature,
        spam: params.spam,
        deleted: params.deleted,
        lang_in: params.lang_id.clone(),
        lang_not_in: params.lang_id_exclude.clone(),
        orderby: params.orderby,
        no_found_rows: false,
        ..SiteQueryArgs::default()
    };

    if let Some(search) = &params.search {
        args.search = search.clone();
    }

    if params.before.is_some() || params.after.is_some() {
        args.date_query.push(DateRange {
            before: params.before,
            after: params.after,
        });
    }

    match params.offset {
        Some(offset) if offset > 0 => args.offset = offset,
        _ => {
            args.offset = u64::from(params.per_page) * u64::from(params.page.saturating_sub(1));
        }
    }

    args
}

/// Build a collection link for the given page, preserving every other
/// query argument of the current request.
pub fn page_link(base: &str, raw_query: Option<&str>, page: u32) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(raw) = raw_query {
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            if key != "page" {
                query.append_pair(&key, &value);
            }
        }
    }
    query.append_pair("page", &page.to_string());
    format!("{base}?{}", query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    // serde_urlencoded is what axum's Query extractor parses with.
    fn params_from(query: &str) -> SiteListParams {
        serde_urlencoded::from_str(query).expect("params should deserialize")
    }

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let params = params_from("");

        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, DEFAULT_PER_PAGE);
        assert_eq!(params.order, Order::Desc);
        assert_eq!(params.orderby, OrderBy::Id);
        assert_eq!(params.context, Context::View);

        let args = build_query_args(&params);
        assert_eq!(args.number, DEFAULT_PER_PAGE);
        assert_eq!(args.offset, 0);
        assert!(!args.no_found_rows);
        assert!(args.date_query.is_empty());
        // Untouched single-value filters keep the engine's "no constraint"
        // empty-string form.
        assert_eq!(args.search, "");
        assert_eq!(args.domain, "");
        assert_eq!(args.path, "");
        assert_eq!(args.lang_id, "");
    }

    #[test]
    fn public_names_map_to_engine_names() {
        let params = params_from(
            "domain=a.org,b.org&domain_exclude=c.org&exclude=3,4&include=1,2\
             &network=1&network_exclude=2&path=/x/&path_exclude=/y/\
             &lang_id=5&lang_id_exclude=6&search=blog&archived=1",
        );

        let args = build_query_args(&params);

        assert_eq!(args.domain_in, vec!["a.org", "b.org"]);
        assert_eq!(args.domain_not_in, vec!["c.org"]);
        assert_eq!(args.site_not_in, vec![3, 4]);
        assert_eq!(args.site_in, vec![1, 2]);
        assert_eq!(args.network_in, vec![1]);
        assert_eq!(args.network_not_in, vec![2]);
        assert_eq!(args.path_in, vec!["/x/"]);
        assert_eq!(args.path_not_in, vec!["/y/"]);
        assert_eq!(args.lang_in, vec![5]);
        assert_eq!(args.lang_not_in, vec![6]);
        assert_eq!(args.search, "blog");
        assert_eq!(args.archived, Some(1));
        assert_eq!(args.public, None);
    }

    #[test]
    fn orderby_is_copied_verbatim() {
        let params = params_from("orderby=domain_length&order=asc");
        let args = build_query_args(&params);

        assert_eq!(args.orderby, OrderBy::DomainLength);
        assert_eq!(args.order, Order::Asc);
    }

    #[test]
    fn page_derives_the_offset() {
        let params = params_from("per_page=10&page=3");
        let args = build_query_args(&params);

        assert_eq!(args.offset, 20);
        assert_eq!(args.number, 10);
    }

    #[test]
    fn page_one_means_offset_zero() {
        let params = params_from("per_page=25");
        let args = build_query_args(&params);

        assert_eq!(args.offset, 0);
    }

    #[test]
    fn explicit_offset_wins_over_page() {
        let params = params_from("per_page=10&page=3&offset=7");
        let args = build_query_args(&params);

        assert_eq!(args.offset, 7);
    }

    #[test]
    fn offset_zero_counts_as_unset() {
        let params = params_from("per_page=10&page=3&offset=0");
        let args = build_query_args(&params);

        assert_eq!(args.offset, 20);
    }

    #[test]
    fn date_bounds_nest_in_a_single_range() {
        let params = params_from("before=2026-01-01T00:00:00Z&after=2025-01-01T00:00:00Z");
        let args = build_query_args(&params);

        assert_eq!(args.date_query.len(), 1);
        let range = &args.date_query[0];
        assert!(range.before.is_some());
        assert!(range.after.is_some());
    }

    #[test]
    fn absent_dates_leave_the_date_query_empty() {
        let args = build_query_args(&params_from(""));
        assert!(args.date_query.is_empty());
    }

    #[test]
    fn per_page_range_is_enforced() {
        assert!(params_from("per_page=100").check_ranges().is_ok());
        assert!(params_from("per_page=101").check_ranges().is_err());
        assert!(params_from("per_page=0").check_ranges().is_err());
    }

    #[test]
    fn page_link_overrides_page_and_keeps_the_rest() {
        let link = page_link(
            "http://localhost:3000/api/v1/sites",
            Some("per_page=10&page=3&search=blog"),
            2,
        );

        assert_eq!(
            link,
            "http://localhost:3000/api/v1/sites?per_page=10&search=blog&page=2"
        );
    }

    #[test]
    fn page_link_works_without_an_existing_query() {
        let link = page_link("http://localhost:3000/api/v1/sites", None, 4);
        assert_eq!(link, "http://localhost:3000/api/v1/sites?page=4");
    }
}
