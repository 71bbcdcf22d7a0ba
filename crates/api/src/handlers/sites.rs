//! Handlers for the `/sites` resource.
//!
//! Translates collection query parameters into engine arguments, builds
//! the pagination headers, and delegates persistence and permission
//! checks to the collaborators carried in [`AppState`].

use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use validator::Validate;

use sitenet_core::capability::{Authorizer as _, Capability};
use sitenet_core::site::{Site, SiteData, SiteFlagFields};
use sitenet_core::types::DbId;
use sitenet_store::{SiteMetaStore as _, SiteStore as _};

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthUser;
use crate::query::{build_query_args, page_link, Context, SiteListParams};
use crate::schema;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request structs
// ---------------------------------------------------------------------------

/// Query parameters for single-item reads.
#[derive(Debug, Deserialize)]
pub struct ItemParams {
    #[serde(default)]
    pub context: Context,
}

fn default_true() -> bool {
    true
}

/// Query parameters for deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    /// Accepted for wire compatibility; sites have no trash stage to
    /// bypass.
    #[serde(default = "default_true")]
    pub force: bool,
    /// Whether to also tear down the site's underlying storage.
    #[serde(default = "default_true")]
    pub uninitialize_site: bool,
}

/// Body for creating a site.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSiteRequest {
    /// Creation rejects explicit ids; the store assigns them.
    pub id: Option<DbId>,
    #[validate(length(min = 1, message = "domain must not be empty"))]
    pub domain: String,
    pub path: Option<String>,
    pub network: Option<DbId>,
    pub public: Option<i64>,
    pub archived: Option<i64>,
    pub mature: Option<i64>,
    pub spam: Option<i64>,
    pub deleted: Option<i64>,
    pub lang_id: Option<i64>,
    pub meta: Option<Map<String, Value>>,
}

/// Body for updating a site; only supplied fields change.
#[derive(Debug, Deserialize)]
pub struct UpdateSiteRequest {
    pub domain: Option<String>,
    pub path: Option<String>,
    pub network: Option<DbId>,
    pub public: Option<i64>,
    pub archived: Option<i64>,
    pub mature: Option<i64>,
    pub spam: Option<i64>,
    pub deleted: Option<i64>,
    pub lang_id: Option<i64>,
    pub meta: Option<Map<String, Value>>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve an id to a site, or the invalid-id error distinct from any
/// permission failure.
async fn find_site(state: &AppState, id: DbId) -> ApiResult<Site> {
    if id <= 0 {
        return Err(ApiError::InvalidSiteId);
    }
    state
        .store
        .get_site(id)
        .await?
        .ok_or(ApiError::InvalidSiteId)
}

/// Shape a site into its public representation for the given context.
///
/// `embed` omits the display attributes. The `meta` object is present only
/// when the registry declares fields, and carries exactly the declared
/// keys. Response filter hooks run last.
async fn prepare_site_response(
    state: &AppState,
    site: &Site,
    context: Context,
) -> ApiResult<Value> {
    let mut repr = Map::new();
    repr.insert("id".into(), json!(site.id));
    repr.insert("network".into(), json!(site.network_id));
    repr.insert("domain".into(), json!(site.domain));
    repr.insert("path".into(), json!(site.path));
    repr.insert("registered".into(), json!(site.registered));
    repr.insert("last_updated".into(), json!(site.last_updated));
    repr.insert("public".into(), json!(site.public));
    repr.insert("archived".into(), json!(site.archived));
    repr.insert("mature".into(), json!(site.mature));
    repr.insert("spam".into(), json!(site.spam));
    repr.insert("deleted".into(), json!(site.deleted));
    repr.insert("lang_id".into(), json!(site.lang_id));

    if context != Context::Embed {
        repr.insert("blogname".into(), json!(site.blogname));
        repr.insert("siteurl".into(), json!(site.siteurl));
        repr.insert("home".into(), json!(site.home));
        repr.insert("post_count".into(), json!(site.post_count));
    }

    if !state.meta_registry.is_empty() {
        let stored = state.meta.get(site.id).await?;
        let mut meta = Map::new();
        for field in state.meta_registry.fields() {
            meta.insert(
                field.key.clone(),
                stored.get(&field.key).cloned().unwrap_or(Value::Null),
            );
        }
        repr.insert("meta".into(), Value::Object(meta));
    }

    let mut value = Value::Object(repr);
    state.hooks.filter_response(&mut value, site);
    Ok(value)
}

/// Write the declared subset of the supplied metadata.
async fn apply_meta(
    state: &AppState,
    site_id: DbId,
    meta: &Map<String, Value>,
) -> ApiResult<()> {
    for (key, value) in meta {
        if state.meta_registry.contains(key) {
            state.meta.set(site_id, key, value.clone()).await?;
        }
    }
    Ok(())
}

/// Build prepared data for the store, resolving and validating the
/// network id. The flag fields stay nested; update flattens them before
/// the store call.
async fn prepare_for_database(
    state: &AppState,
    network: Option<DbId>,
    fallback_network: Option<DbId>,
    domain: Option<String>,
    path: Option<String>,
    fields: SiteFlagFields,
) -> ApiResult<SiteData> {
    let network_id = match network {
        Some(id) => {
            if !state.store.network_exists(id).await? {
                return Err(ApiError::InvalidNetworkId);
            }
            Some(id)
        }
        None => fallback_network,
    };

    Ok(SiteData {
        network_id,
        domain,
        path,
        fields,
        ..SiteData::default()
    })
}

// ---------------------------------------------------------------------------
// Collection handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/sites
///
/// List sites with filtering and pagination. Emits `X-WP-Total` and
/// `X-WP-TotalPages` plus `prev`/`next` `Link` headers.
pub async fn list_sites(
    auth: AuthUser,
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<SiteListParams>,
) -> ApiResult<Response> {
    params.check_ranges()?;

    let ctx = auth.context(&state);
    if !state.authorizer.user_can(&ctx, Capability::ManageSites) {
        return Err(ApiError::ForbiddenContext);
    }

    let mut args = build_query_args(&params);
    state.hooks.filter_site_query(&mut args);

    let result = state.store.query(&args).await?;

    let mut sites = Vec::with_capacity(result.sites.len());
    for site in &result.sites {
        // Rows failing the read predicate are dropped without adjusting
        // the reported total.
        if !state.authorizer.can_read_site(&ctx, site) {
            continue;
        }
        sites.push(prepare_site_response(&state, site, params.context).await?);
    }

    let mut total = result.found;
    let mut max_pages = result.max_num_pages;

    if total < 1 {
        // Out of bounds: the limited query reports zero, so re-run
        // without the limit in count mode for the true total.
        let mut count_args = args.clone();
        count_args.number = 0;
        count_args.offset = 0;
        count_args.count = true;

        total = state.store.query(&count_args).await?.found;
        max_pages = total.div_ceil(u64::from(params.per_page)) as u32;
    }

    let mut headers = HeaderMap::new();
    headers.insert("x-wp-total", HeaderValue::from(total));
    headers.insert("x-wp-totalpages", HeaderValue::from(max_pages));

    let base = state.config.sites_url();
    let raw = raw_query.as_deref();

    if params.page > 1 {
        let mut prev_page = params.page - 1;
        if prev_page > max_pages {
            prev_page = max_pages;
        }
        let link = format!("<{}>; rel=\"prev\"", page_link(&base, raw, prev_page));
        if let Ok(value) = HeaderValue::from_str(&link) {
            headers.append(header::LINK, value);
        }
    }
    if max_pages > params.page {
        let link = format!("<{}>; rel=\"next\"", page_link(&base, raw, params.page + 1));
        if let Ok(value) = HeaderValue::from_str(&link) {
            headers.append(header::LINK, value);
        }
    }

    Ok((headers, Json(Value::Array(sites))).into_response())
}

/// POST /api/v1/sites
///
/// Create a site. Responds `201` with a `Location` header pointing at the
/// new resource.
pub async fn create_site(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSiteRequest>,
) -> ApiResult<Response> {
    let ctx = auth.context(&state);
    if !state.authorizer.user_can(&ctx, Capability::CreateSites) {
        return Err(ApiError::Forbidden);
    }

    if input.id.is_some() {
        return Err(ApiError::SiteExists);
    }
    input
        .validate()
        .map_err(|e| ApiError::InvalidParam(e.to_string()))?;

    let fields = SiteFlagFields {
        public: input.public,
        archived: input.archived,
        mature: input.mature,
        spam: input.spam,
        deleted: input.deleted,
        lang_id: input.lang_id,
    };
    let path = input.path.clone().filter(|p| !p.is_empty());
    let mut data = prepare_for_database(
        &state,
        input.network,
        Some(ctx.network_id),
        Some(input.domain.clone()),
        Some(path.unwrap_or_else(|| "/".to_string())),
        fields,
    )
    .await?;

    state.hooks.run_pre_insert(&mut data)?;

    let site = state.store.insert_site(&data).await?;

    tracing::info!(
        user_id = ctx.user_id,
        site_id = site.id,
        domain = %site.domain,
        "site created"
    );

    state.hooks.notify_saved(&site, true);

    if let Some(meta) = &input.meta {
        if !state.meta_registry.is_empty() {
            apply_meta(&state, site.id, meta).await?;
        }
    }

    let context = if state.authorizer.user_can(&ctx, Capability::ManageSites) {
        Context::Edit
    } else {
        Context::View
    };
    let repr = prepare_site_response(&state, &site, context).await?;

    let mut headers = HeaderMap::new();
    let location = format!("{}/{}", state.config.sites_url(), site.id);
    if let Ok(value) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, value);
    }

    Ok((StatusCode::CREATED, headers, Json(repr)).into_response())
}

/// OPTIONS /api/v1/sites
///
/// Describe the resource: item schema plus the collection parameters.
pub async fn describe_collection(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "schema": schema::item_schema(&state.meta_registry),
        "args": schema::collection_params(),
    }))
}

// ---------------------------------------------------------------------------
// Item handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/sites/{id}
///
/// Read a single site. `context=edit` requires site management rights.
pub async fn get_site(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ItemParams>,
) -> ApiResult<Json<Value>> {
    let site = find_site(&state, id).await?;

    let ctx = auth.context(&state);
    if params.context == Context::Edit
        && !state.authorizer.user_can(&ctx, Capability::ManageSites)
    {
        return Err(ApiError::ForbiddenContext);
    }

    let repr = prepare_site_response(&state, &site, params.context).await?;
    Ok(Json(repr))
}

/// PUT/PATCH /api/v1/sites/{id}
///
/// Partially update a site; only supplied fields change.
pub async fn update_site(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSiteRequest>,
) -> ApiResult<Json<Value>> {
    let site = find_site(&state, id).await?;

    let ctx = auth.context(&state);
    if !state.authorizer.user_can(&ctx, Capability::ManageSites) {
        return Err(ApiError::CannotEdit);
    }

    let fields = SiteFlagFields {
        public: input.public,
        archived: input.archived,
        mature: input.mature,
        spam: input.spam,
        deleted: input.deleted,
        lang_id: input.lang_id,
    };
    let mut data = prepare_for_database(
        &state,
        input.network,
        None,
        input.domain.clone(),
        input.path.clone(),
        fields,
    )
    .await?;
    // The store only honours top-level flags; lift the nested group.
    data.flatten_fields();

    let updated = state.store.update_site(site.id, &data).await?;

    tracing::info!(user_id = ctx.user_id, site_id = id, "site updated");

    state.hooks.notify_saved(&updated, false);

    if let Some(meta) = &input.meta {
        if !state.meta_registry.is_empty() {
            apply_meta(&state, updated.id, meta).await?;
        }
    }

    let repr = prepare_site_response(&state, &updated, Context::Edit).await?;
    Ok(Json(repr))
}

/// DELETE /api/v1/sites/{id}
///
/// Delete a site. The response carries the representation as it was
/// before deletion. `uninitialize_site=false` skips the storage teardown
/// callbacks.
pub async fn delete_site(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<DeleteParams>,
) -> ApiResult<Json<Value>> {
    let site = find_site(&state, id).await?;

    let ctx = auth.context(&state);
    if !state.authorizer.user_can(&ctx, Capability::DeleteSites) {
        return Err(ApiError::CannotDelete);
    }

    let previous = prepare_site_response(&state, &site, Context::Edit).await?;

    let removed = state.store.delete_site(site.id).await?;
    if params.uninitialize_site {
        state.hooks.run_uninitialize(&removed);
    }

    tracing::info!(
        user_id = ctx.user_id,
        site_id = id,
        uninitialized = params.uninitialize_site,
        forced = params.force,
        "site deleted"
    );

    state.hooks.notify_deleted(&removed);

    Ok(Json(json!({
        "deleted": true,
        "previous": previous,
    })))
}

/// OPTIONS /api/v1/sites/{id}
///
/// Describe the item resource.
pub async fn describe_item(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "schema": schema::item_schema(&state.meta_registry) }))
}
