//! Site entity and prepared-data types.

use serde::Serialize;

use crate::types::{DbId, Timestamp};

/// A site record as held by the storage collaborator.
///
/// The five status flags are independent 0/1 integers, not one-of-five
/// states. `blogname`, `siteurl`, `home` and `post_count` are display
/// attributes derived by the platform and are read-only through the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Site {
    pub id: DbId,
    /// Network the site belongs to.
    pub network_id: DbId,
    pub domain: String,
    pub path: String,
    pub registered: Timestamp,
    pub last_updated: Timestamp,
    pub public: i64,
    pub archived: i64,
    pub mature: i64,
    pub spam: i64,
    pub deleted: i64,
    pub lang_id: i64,
    pub blogname: String,
    pub siteurl: String,
    pub home: String,
    pub post_count: i64,
}

/// The status-flag fields that travel as a nested group inside prepared
/// data. The update pipeline flattens them onto [`SiteData`] before the
/// store call; the insert pipeline leaves them nested, where the store
/// ignores them and applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteFlagFields {
    pub public: Option<i64>,
    pub archived: Option<i64>,
    pub mature: Option<i64>,
    pub spam: Option<i64>,
    pub deleted: Option<i64>,
    pub lang_id: Option<i64>,
}

impl SiteFlagFields {
    pub fn is_empty(&self) -> bool {
        self.public.is_none()
            && self.archived.is_none()
            && self.mature.is_none()
            && self.spam.is_none()
            && self.deleted.is_none()
            && self.lang_id.is_none()
    }
}

/// Prepared data handed to the store for insert and update calls.
///
/// `None` means "leave unchanged" on update. The store only honours the
/// top-level flag fields; [`SiteData::flatten_fields`] moves the nested
/// group there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteData {
    pub network_id: Option<DbId>,
    pub domain: Option<String>,
    pub path: Option<String>,
    /// Nested flag group, see [`SiteFlagFields`].
    pub fields: SiteFlagFields,
    pub public: Option<i64>,
    pub archived: Option<i64>,
    pub mature: Option<i64>,
    pub spam: Option<i64>,
    pub deleted: Option<i64>,
    pub lang_id: Option<i64>,
}

impl SiteData {
    /// Move the nested flag group to the top-level fields the store reads.
    ///
    /// Values already set at the top level win over nested ones.
    pub fn flatten_fields(&mut self) {
        let fields = std::mem::take(&mut self.fields);
        self.public = self.public.or(fields.public);
        self.archived = self.archived.or(fields.archived);
        self.mature = self.mature.or(fields.mature);
        self.spam = self.spam.or(fields.spam);
        self.deleted = self.deleted.or(fields.deleted);
        self.lang_id = self.lang_id.or(fields.lang_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_moves_nested_flags_to_top_level() {
        let mut data = SiteData {
            fields: SiteFlagFields {
                archived: Some(1),
                lang_id: Some(3),
                ..SiteFlagFields::default()
            },
            ..SiteData::default()
        };

        data.flatten_fields();

        assert_eq!(data.archived, Some(1));
        assert_eq!(data.lang_id, Some(3));
        assert_eq!(data.public, None);
        assert!(data.fields.is_empty());
    }

    #[test]
    fn flatten_keeps_existing_top_level_values() {
        let mut data = SiteData {
            public: Some(0),
            fields: SiteFlagFields {
                public: Some(1),
                ..SiteFlagFields::default()
            },
            ..SiteData::default()
        };

        data.flatten_fields();

        assert_eq!(data.public, Some(0));
    }
}
