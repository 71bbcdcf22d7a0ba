//! Reference in-memory implementations of the storage collaborators.
//!
//! [`MemoryStore`] implements the query-engine contract the controller
//! assumes, including the quirk that a limited query whose page is empty
//! reports `found = 0` rather than the true total; callers needing the
//! real count re-run in count mode.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use sitenet_core::query::{Order, OrderBy, SiteQueryArgs};
use sitenet_core::site::{Site, SiteData};
use sitenet_core::types::DbId;

use crate::{QueryResult, SiteMetaStore, SiteStore, StoreError};

/// Network id used when prepared data names none.
pub const DEFAULT_NETWORK_ID: DbId = 1;

#[derive(Debug, Default)]
struct Inner {
    sites: BTreeMap<DbId, Site>,
    networks: BTreeSet<DbId>,
    next_id: DbId,
}

/// In-memory site store.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the default network registered.
    pub fn new() -> Self {
        let mut networks = BTreeSet::new();
        networks.insert(DEFAULT_NETWORK_ID);
        Self {
            inner: RwLock::new(Inner {
                sites: BTreeMap::new(),
                networks,
                next_id: 1,
            }),
        }
    }

    /// Register an additional network id.
    pub fn add_network(&self, id: DbId) {
        if let Ok(mut inner) = self.inner.write() {
            inner.networks.insert(id);
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("state lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("state lock poisoned".into()))
    }
}

fn matches(site: &Site, args: &SiteQueryArgs) -> bool {
    if !args.site_in.is_empty() && !args.site_in.contains(&site.id) {
        return false;
    }
    if args.site_not_in.contains(&site.id) {
        return false;
    }

    if !args.domain.is_empty() && site.domain != args.domain {
        return false;
    }
    if !args.domain_in.is_empty() && !args.domain_in.contains(&site.domain) {
        return false;
    }
    if args.domain_not_in.contains(&site.domain) {
        return false;
    }

    if !args.path.is_empty() && site.path != args.path {
        return false;
    }
    if !args.path_in.is_empty() && !args.path_in.contains(&site.path) {
        return false;
    }
    if args.path_not_in.contains(&site.path) {
        return false;
    }

    if !args.network_in.is_empty() && !args.network_in.contains(&site.network_id) {
        return false;
    }
    if args.network_not_in.contains(&site.network_id) {
        return false;
    }

    if !args.lang_id.is_empty() {
        if let Ok(lang) = args.lang_id.parse::<i64>() {
            if site.lang_id != lang {
                return false;
            }
        }
    }
    if !args.lang_in.is_empty() && !args.lang_in.contains(&site.lang_id) {
        return false;
    }
    if args.lang_not_in.contains(&site.lang_id) {
        return false;
    }

    for (filter, value) in [
        (args.public, site.public),
        (args.archived, site.archived),
        (args.mature, site.mature),
        (args.spam, site.spam),
        (args.deleted, site.deleted),
    ] {
        if let Some(wanted) = filter {
            if value != wanted {
                return false;
            }
        }
    }

    if !args.search.is_empty() {
        let needle = args.search.to_lowercase();
        if !site.domain.to_lowercase().contains(&needle)
            && !site.path.to_lowercase().contains(&needle)
        {
            return false;
        }
    }

    for range in &args.date_query {
        if let Some(before) = range.before {
            if site.registered >= before {
                return false;
            }
        }
        if let Some(after) = range.after {
            if site.registered <= after {
                return false;
            }
        }
    }

    true
}

fn sort_sites(sites: &mut [Site], args: &SiteQueryArgs) {
    let position = |list: &[DbId], id: DbId| list.iter().position(|&x| x == id).unwrap_or(usize::MAX);

    match args.orderby {
        OrderBy::Id => sites.sort_by_key(|s| s.id),
        OrderBy::Domain => sites.sort_by(|a, b| a.domain.cmp(&b.domain)),
        OrderBy::Path => sites.sort_by(|a, b| a.path.cmp(&b.path)),
        OrderBy::NetworkId => sites.sort_by_key(|s| s.network_id),
        OrderBy::LastUpdated => sites.sort_by_key(|s| s.last_updated),
        OrderBy::Registered => sites.sort_by_key(|s| s.registered),
        OrderBy::DomainLength => sites.sort_by_key(|s| s.domain.len()),
        OrderBy::PathLength => sites.sort_by_key(|s| s.path.len()),
        OrderBy::SiteIn => sites.sort_by_key(|s| position(&args.site_in, s.id)),
        OrderBy::NetworkIn => sites.sort_by_key(|s| position(&args.network_in, s.network_id)),
    }

    // List-positional orders are explicit and ignore the direction flag.
    let positional = matches!(args.orderby, OrderBy::SiteIn | OrderBy::NetworkIn);
    if args.order == Order::Desc && !positional {
        sites.reverse();
    }
}

fn site_urls(domain: &str, path: &str) -> (String, String) {
    let url = format!("http://{domain}{path}");
    (url.clone(), url)
}

#[async_trait]
impl SiteStore for MemoryStore {
    async fn query(&self, args: &SiteQueryArgs) -> Result<QueryResult, StoreError> {
        let inner = self.read()?;

        let mut matched: Vec<Site> = inner
            .sites
            .values()
            .filter(|s| matches(s, args))
            .cloned()
            .collect();
        drop(inner);

        sort_sites(&mut matched, args);
        let total = matched.len() as u64;

        if args.count {
            return Ok(QueryResult {
                sites: Vec::new(),
                found: total,
                max_num_pages: 0,
            });
        }

        let offset = usize::try_from(args.offset).unwrap_or(usize::MAX);
        let mut page: Vec<Site> = matched.into_iter().skip(offset).collect();
        if args.number > 0 {
            page.truncate(args.number as usize);
        }

        let found = if args.no_found_rows || page.is_empty() {
            0
        } else {
            total
        };
        let max_num_pages = if args.number > 0 && found > 0 {
            (found.div_ceil(u64::from(args.number))) as u32
        } else {
            0
        };

        Ok(QueryResult {
            sites: page,
            found,
            max_num_pages,
        })
    }

    async fn get_site(&self, id: DbId) -> Result<Option<Site>, StoreError> {
        Ok(self.read()?.sites.get(&id).cloned())
    }

    async fn insert_site(&self, data: &SiteData) -> Result<Site, StoreError> {
        let domain = data.domain.clone().unwrap_or_default();
        if domain.is_empty() {
            return Err(StoreError::EmptyDomain);
        }
        let path = data.path.clone().unwrap_or_else(|| "/".to_string());
        let network_id = data.network_id.unwrap_or(DEFAULT_NETWORK_ID);

        let mut inner = self.write()?;
        if !inner.networks.contains(&network_id) {
            return Err(StoreError::NetworkNotFound);
        }
        let taken = inner
            .sites
            .values()
            .any(|s| s.network_id == network_id && s.domain == domain && s.path == path);
        if taken {
            return Err(StoreError::SiteTaken);
        }

        let id = inner.next_id;
        inner.next_id += 1;

        let now = Utc::now();
        let (siteurl, home) = site_urls(&domain, &path);
        let site = Site {
            id,
            network_id,
            blogname: domain.clone(),
            domain,
            path,
            registered: now,
            last_updated: now,
            public: data.public.unwrap_or(1),
            archived: data.archived.unwrap_or(0),
            mature: data.mature.unwrap_or(0),
            spam: data.spam.unwrap_or(0),
            deleted: data.deleted.unwrap_or(0),
            lang_id: data.lang_id.unwrap_or(0),
            siteurl,
            home,
            post_count: 0,
        };
        inner.sites.insert(id, site.clone());
        tracing::debug!(site_id = id, domain = %site.domain, "site inserted");
        Ok(site)
    }

    async fn update_site(&self, id: DbId, data: &SiteData) -> Result<Site, StoreError> {
        let mut inner = self.write()?;
        if let Some(network_id) = data.network_id {
            if !inner.networks.contains(&network_id) {
                return Err(StoreError::NetworkNotFound);
            }
        }
        let site = inner.sites.get_mut(&id).ok_or(StoreError::SiteNotFound)?;

        if let Some(network_id) = data.network_id {
            site.network_id = network_id;
        }
        if let Some(domain) = &data.domain {
            if domain.is_empty() {
                return Err(StoreError::EmptyDomain);
            }
            site.domain = domain.clone();
        }
        if let Some(path) = &data.path {
            site.path = path.clone();
        }
        if let Some(public) = data.public {
            site.public = public;
        }
        if let Some(archived) = data.archived {
            site.archived = archived;
        }
        if let Some(mature) = data.mature {
            site.mature = mature;
        }
        if let Some(spam) = data.spam {
            site.spam = spam;
        }
        if let Some(deleted) = data.deleted {
            site.deleted = deleted;
        }
        if let Some(lang_id) = data.lang_id {
            site.lang_id = lang_id;
        }

        let (siteurl, home) = site_urls(&site.domain, &site.path);
        site.siteurl = siteurl;
        site.home = home;
        site.last_updated = Utc::now();

        tracing::debug!(site_id = id, "site updated");
        Ok(site.clone())
    }

    async fn delete_site(&self, id: DbId) -> Result<Site, StoreError> {
        let mut inner = self.write()?;
        let site = inner.sites.remove(&id).ok_or(StoreError::SiteNotFound)?;
        tracing::debug!(site_id = id, domain = %site.domain, "site deleted");
        Ok(site)
    }

    async fn network_exists(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.read()?.networks.contains(&id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}

/// In-memory site metadata store.
#[derive(Debug, Default)]
pub struct MemoryMetaStore {
    inner: RwLock<BTreeMap<DbId, BTreeMap<String, serde_json::Value>>>,
}

impl MemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SiteMetaStore for MemoryMetaStore {
    async fn get(&self, site_id: DbId) -> Result<BTreeMap<String, serde_json::Value>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::Backend("meta lock poisoned".into()))?;
        Ok(inner.get(&site_id).cloned().unwrap_or_default())
    }

    async fn set(
        &self,
        site_id: DbId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("meta lock poisoned".into()))?;
        inner.entry(site_id).or_default().insert(key.to_string(), value);
        Ok(())
    }

    async fn purge(&self, site_id: DbId) -> Result<(), StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("meta lock poisoned".into()))?;
        inner.remove(&site_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use sitenet_core::query::DateRange;

    use super::*;

    async fn store_with_sites(count: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..count {
            let data = SiteData {
                domain: Some(format!("site{i}.example.org")),
                path: Some("/".to_string()),
                ..SiteData::default()
            };
            store.insert_site(&data).await.expect("insert");
        }
        store
    }

    fn paged(per_page: u32, page: u64) -> SiteQueryArgs {
        SiteQueryArgs {
            number: per_page,
            offset: per_page as u64 * (page - 1),
            no_found_rows: false,
            ..SiteQueryArgs::default()
        }
    }

    #[tokio::test]
    async fn limited_query_reports_total_and_pages() {
        let store = store_with_sites(51).await;

        let result = store.query(&paged(10, 1)).await.expect("query");

        assert_eq!(result.sites.len(), 10);
        assert_eq!(result.found, 51);
        assert_eq!(result.max_num_pages, 6);
    }

    #[tokio::test]
    async fn empty_page_reports_found_zero() {
        let store = store_with_sites(51).await;

        let result = store.query(&paged(10, 8)).await.expect("query");

        assert!(result.sites.is_empty());
        assert_eq!(result.found, 0);
        assert_eq!(result.max_num_pages, 0);
    }

    #[tokio::test]
    async fn count_mode_reports_the_true_total() {
        let store = store_with_sites(51).await;

        let args = SiteQueryArgs {
            count: true,
            ..SiteQueryArgs::default()
        };
        let result = store.query(&args).await.expect("query");

        assert!(result.sites.is_empty());
        assert_eq!(result.found, 51);
    }

    #[tokio::test]
    async fn domain_and_id_filters_compose() {
        let store = store_with_sites(5).await;

        let args = SiteQueryArgs {
            domain_in: vec!["site1.example.org".into(), "site3.example.org".into()],
            site_not_in: vec![2],
            no_found_rows: false,
            ..SiteQueryArgs::default()
        };
        let result = store.query(&args).await.expect("query");

        // Site ids are 1-based: site1.example.org has id 2, which is excluded.
        assert_eq!(result.sites.len(), 1);
        assert_eq!(result.sites[0].domain, "site3.example.org");
    }

    #[tokio::test]
    async fn flag_filters_match_exact_values() {
        let store = store_with_sites(3).await;
        store
            .update_site(
                2,
                &SiteData {
                    archived: Some(1),
                    ..SiteData::default()
                },
            )
            .await
            .expect("update");

        let args = SiteQueryArgs {
            archived: Some(1),
            no_found_rows: false,
            ..SiteQueryArgs::default()
        };
        let result = store.query(&args).await.expect("query");

        assert_eq!(result.sites.len(), 1);
        assert_eq!(result.sites[0].id, 2);
    }

    #[tokio::test]
    async fn default_order_is_id_descending() {
        let store = store_with_sites(3).await;

        let args = SiteQueryArgs {
            no_found_rows: false,
            ..SiteQueryArgs::default()
        };
        let result = store.query(&args).await.expect("query");

        let ids: Vec<_> = result.sites.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn site_in_order_preserves_list_position() {
        let store = store_with_sites(4).await;

        let args = SiteQueryArgs {
            site_in: vec![3, 1, 4],
            orderby: OrderBy::SiteIn,
            no_found_rows: false,
            ..SiteQueryArgs::default()
        };
        let result = store.query(&args).await.expect("query");

        let ids: Vec<_> = result.sites.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 1, 4]);
    }

    #[tokio::test]
    async fn date_range_bounds_registered() {
        let store = store_with_sites(2).await;
        let cutoff = Utc::now() + chrono::Duration::hours(1);

        let args = SiteQueryArgs {
            date_query: vec![DateRange {
                before: Some(cutoff),
                after: None,
            }],
            no_found_rows: false,
            ..SiteQueryArgs::default()
        };
        assert_eq!(store.query(&args).await.expect("query").sites.len(), 2);

        let args = SiteQueryArgs {
            date_query: vec![DateRange {
                before: None,
                after: Some(cutoff),
            }],
            no_found_rows: false,
            ..SiteQueryArgs::default()
        };
        assert!(store.query(&args).await.expect("query").sites.is_empty());
    }

    #[tokio::test]
    async fn duplicate_domain_path_is_rejected() {
        let store = MemoryStore::new();
        let data = SiteData {
            domain: Some("example.org".into()),
            path: Some("/".into()),
            ..SiteData::default()
        };
        store.insert_site(&data).await.expect("first insert");

        let err = store.insert_site(&data).await.expect_err("duplicate");
        assert_matches!(err, StoreError::SiteTaken);
        assert_eq!(err.code(), "site_taken");
    }

    #[tokio::test]
    async fn insert_ignores_nested_flag_fields() {
        let store = MemoryStore::new();
        let data = SiteData {
            domain: Some("example.org".into()),
            fields: sitenet_core::site::SiteFlagFields {
                archived: Some(1),
                ..Default::default()
            },
            ..SiteData::default()
        };

        let site = store.insert_site(&data).await.expect("insert");

        assert_eq!(site.public, 1);
        assert_eq!(site.archived, 0);
        assert_eq!(site.path, "/");
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let store = store_with_sites(1).await;

        let updated = store
            .update_site(
                1,
                &SiteData {
                    spam: Some(1),
                    ..SiteData::default()
                },
            )
            .await
            .expect("update");

        assert_eq!(updated.spam, 1);
        assert_eq!(updated.domain, "site0.example.org");
        assert!(updated.last_updated >= updated.registered);
    }

    #[tokio::test]
    async fn update_to_unknown_network_fails() {
        let store = store_with_sites(1).await;

        let err = store
            .update_site(
                1,
                &SiteData {
                    network_id: Some(99),
                    ..SiteData::default()
                },
            )
            .await
            .expect_err("unknown network");
        assert_matches!(err, StoreError::NetworkNotFound);
    }

    #[tokio::test]
    async fn delete_returns_the_removed_record() {
        let store = store_with_sites(2).await;

        let removed = store.delete_site(1).await.expect("delete");
        assert_eq!(removed.id, 1);
        assert!(store.get_site(1).await.expect("get").is_none());

        let err = store.delete_site(1).await.expect_err("already gone");
        assert_matches!(err, StoreError::SiteNotFound);
    }

    #[tokio::test]
    async fn meta_store_round_trip_and_purge() {
        let meta = MemoryMetaStore::new();
        meta.set(1, "color", serde_json::json!("#abcdef"))
            .await
            .expect("set");

        let stored = meta.get(1).await.expect("get");
        assert_eq!(stored.get("color"), Some(&serde_json::json!("#abcdef")));

        meta.purge(1).await.expect("purge");
        assert!(meta.get(1).await.expect("get").is_empty());
    }
}
