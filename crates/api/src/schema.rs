//! JSON Schema description of the site resource.
//!
//! Served from `OPTIONS` on the collection and item routes, and consulted
//! by the handlers to decide whether the `meta` property is part of the
//! representation.

use serde_json::{json, Map, Value};
use sitenet_core::meta::MetaRegistry;

/// The declared schema of a site representation.
///
/// The `meta` property is present only when at least one metadata field is
/// registered.
pub fn item_schema(meta_registry: &MetaRegistry) -> Value {
    let mut properties = json!({
        "id": {
            "description": "Unique identifier for the site.",
            "type": "integer",
            "context": ["view", "edit", "embed"],
            "readonly": true,
        },
        "network": {
            "description": "The site's network ID. Default is the current network ID.",
            "type": "integer",
            "context": ["view", "edit", "embed"],
        },
        "domain": {
            "description": "Site domain.",
            "type": "string",
            "context": ["view", "edit", "embed"],
            "default": "",
        },
        "path": {
            "description": "Site path.",
            "type": "string",
            "context": ["view", "edit", "embed"],
            "default": "/",
        },
        "registered": {
            "description": "When the site was registered. Default is the current time.",
            "type": "string",
            "format": "date-time",
            "context": ["view", "edit", "embed"],
        },
        "last_updated": {
            "description": "When the site was last updated. Default is the value of registered.",
            "type": "string",
            "format": "date-time",
            "context": ["view", "edit", "embed"],
        },
        "public": {
            "description": "Whether the site is public. Default 1.",
            "type": "integer",
            "context": ["view", "edit", "embed"],
            "default": 1,
        },
        "archived": {
            "description": "Whether the site is archived. Default 0.",
            "type": "integer",
            "context": ["view", "edit", "embed"],
            "default": 0,
        },
        "mature": {
            "description": "Whether the site is mature. Default 0.",
            "type": "integer",
            "context": ["view", "edit", "embed"],
            "default": 0,
        },
        "spam": {
            "description": "Whether the site is spam. Default 0.",
            "type": "integer",
            "context": ["view", "edit", "embed"],
            "default": 0,
        },
        "deleted": {
            "description": "Whether the site is deleted. Default 0.",
            "type": "integer",
            "context": ["view", "edit", "embed"],
            "default": 0,
        },
        "lang_id": {
            "description": "The site's language ID. Default 0.",
            "type": "integer",
            "context": ["view", "edit", "embed"],
            "default": 0,
        },
        "blogname": {
            "description": "The site's display name.",
            "type": "string",
            "context": ["view", "edit"],
        },
        "siteurl": {
            "description": "The site's main URL.",
            "type": "string",
            "context": ["view", "edit"],
        },
        "home": {
            "description": "The site's home URL.",
            "type": "string",
            "context": ["view", "edit"],
        },
        "post_count": {
            "description": "Number of posts on this site.",
            "type": "integer",
            "context": ["view", "edit"],
            "default": 0,
        },
    });

    if !meta_registry.is_empty() {
        let mut meta_properties = Map::new();
        for field in meta_registry.fields() {
            meta_properties.insert(
                field.key.clone(),
                json!({
                    "description": field.description,
                    "type": field.schema_type,
                }),
            );
        }
        if let Some(map) = properties.as_object_mut() {
            map.insert(
                "meta".to_string(),
                json!({
                    "description": "Meta fields.",
                    "type": "object",
                    "context": ["view", "edit"],
                    "properties": Value::Object(meta_properties),
                }),
            );
        }
    }

    json!({
        "$schema": "http://json-schema.org/schema#",
        "title": "site",
        "type": "object",
        "properties": properties,
    })
}

/// The declared query parameters of the collection listing.
pub fn collection_params() -> Value {
    json!({
        "context": { "type": "string", "enum": ["view", "embed", "edit"], "default": "view" },
        "page": { "type": "integer", "default": 1, "minimum": 1 },
        "per_page": { "type": "integer", "default": 10, "minimum": 1, "maximum": 100 },
        "search": { "type": "string" },
        "domain": { "type": "array", "items": { "type": "string" } },
        "domain_exclude": { "type": "array", "items": { "type": "string" } },
        "path": { "type": "array", "items": { "type": "string" } },
        "path_exclude": { "type": "array", "items": { "type": "string" } },
        "exclude": { "type": "array", "items": { "type": "integer" }, "default": [] },
        "include": { "type": "array", "items": { "type": "integer" }, "default": [] },
        "offset": { "type": "integer" },
        "order": { "type": "string", "default": "desc", "enum": ["asc", "desc"] },
        "orderby": {
            "type": "string",
            "default": "id",
            "enum": [
                "id", "domain", "path", "network_id", "last_updated", "registered",
                "domain_length", "path_length", "site__in", "network__in",
            ],
        },
        "network": { "type": "array", "items": { "type": "integer" }, "default": [] },
        "network_exclude": { "type": "array", "items": { "type": "integer" }, "default": [] },
        "public": { "type": "integer" },
        "archived": { "type": "integer" },
        "mature": { "type": "integer" },
        "spam": { "type": "integer" },
        "deleted": { "type": "integer" },
        "lang_id": { "type": "array", "items": { "type": "integer" } },
        "lang_id_exclude": { "type": "array", "items": { "type": "integer" } },
        "before": { "type": "string", "format": "date-time" },
        "after": { "type": "string", "format": "date-time" },
    })
}
