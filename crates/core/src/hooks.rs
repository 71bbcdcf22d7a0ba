//! Extension points for the sites pipeline.
//!
//! Hooks are explicit, ordered callback lists invoked at fixed pipeline
//! stages. Pre-stage hooks may short-circuit the pipeline with an error;
//! post-stage hooks only observe. Callbacks run synchronously on the
//! request path, so long-running observers should hand work to a task.

use crate::query::SiteQueryArgs;
use crate::site::{Site, SiteData};

/// Error returned by a short-circuiting extension point.
///
/// Propagated to the HTTP layer unchanged as a (code, message, status)
/// triple.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct HookError {
    pub code: String,
    pub message: String,
    pub status: u16,
}

impl HookError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
        }
    }
}

type QueryHook = Box<dyn Fn(&mut SiteQueryArgs) + Send + Sync>;
type PreInsertHook = Box<dyn Fn(&mut SiteData) -> Result<(), HookError> + Send + Sync>;
type SavedHook = Box<dyn Fn(&Site, bool) + Send + Sync>;
type ResponseHook = Box<dyn Fn(&mut serde_json::Value, &Site) + Send + Sync>;
type DeletedHook = Box<dyn Fn(&Site) + Send + Sync>;
type UninitializeHook = Box<dyn Fn(&Site) + Send + Sync>;

/// Registry of extension points, built once at startup and shared.
#[derive(Default)]
pub struct Hooks {
    site_query: Vec<QueryHook>,
    pre_insert: Vec<PreInsertHook>,
    saved: Vec<SavedHook>,
    response: Vec<ResponseHook>,
    deleted: Vec<DeletedHook>,
    uninitialize: Vec<UninitializeHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter over translated query arguments. Runs after
    /// translation and before the query executes.
    pub fn on_site_query(
        mut self,
        f: impl Fn(&mut SiteQueryArgs) + Send + Sync + 'static,
    ) -> Self {
        self.site_query.push(Box::new(f));
        self
    }

    /// Register a fallible filter over prepared data, run right before the
    /// store insert. An error short-circuits creation.
    pub fn on_pre_insert(
        mut self,
        f: impl Fn(&mut SiteData) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        self.pre_insert.push(Box::new(f));
        self
    }

    /// Register an observer fired after a site is created or updated. The
    /// flag is true when creating.
    pub fn on_saved(mut self, f: impl Fn(&Site, bool) + Send + Sync + 'static) -> Self {
        self.saved.push(Box::new(f));
        self
    }

    /// Register a filter over the outgoing representation.
    pub fn on_response(
        mut self,
        f: impl Fn(&mut serde_json::Value, &Site) + Send + Sync + 'static,
    ) -> Self {
        self.response.push(Box::new(f));
        self
    }

    /// Register an observer fired after a site is deleted.
    pub fn on_deleted(mut self, f: impl Fn(&Site) + Send + Sync + 'static) -> Self {
        self.deleted.push(Box::new(f));
        self
    }

    /// Register a storage-teardown callback run around delete. Skipped
    /// entirely when the caller opts out of uninitialization.
    pub fn on_uninitialize(mut self, f: impl Fn(&Site) + Send + Sync + 'static) -> Self {
        self.uninitialize.push(Box::new(f));
        self
    }

    pub fn filter_site_query(&self, args: &mut SiteQueryArgs) {
        for hook in &self.site_query {
            hook(args);
        }
    }

    pub fn run_pre_insert(&self, data: &mut SiteData) -> Result<(), HookError> {
        for hook in &self.pre_insert {
            hook(data)?;
        }
        Ok(())
    }

    pub fn notify_saved(&self, site: &Site, creating: bool) {
        for hook in &self.saved {
            hook(site, creating);
        }
    }

    pub fn filter_response(&self, repr: &mut serde_json::Value, site: &Site) {
        for hook in &self.response {
            hook(repr, site);
        }
    }

    pub fn notify_deleted(&self, site: &Site) {
        for hook in &self.deleted {
            hook(site);
        }
    }

    pub fn run_uninitialize(&self, site: &Site) {
        for hook in &self.uninitialize {
            hook(site);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn query_filters_run_in_registration_order() {
        let hooks = Hooks::new()
            .on_site_query(|args| args.site_in.push(1))
            .on_site_query(|args| args.site_in.push(2));

        let mut args = SiteQueryArgs::default();
        hooks.filter_site_query(&mut args);

        assert_eq!(args.site_in, vec![1, 2]);
    }

    #[test]
    fn pre_insert_error_short_circuits_later_hooks() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = Arc::clone(&ran);

        let hooks = Hooks::new()
            .on_pre_insert(|_| Err(HookError::new("blocked", "no new sites today", 400)))
            .on_pre_insert(move |_| {
                ran_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        let err = hooks
            .run_pre_insert(&mut SiteData::default())
            .expect_err("first hook should short-circuit");

        assert_eq!(err.code, "blocked");
        assert_eq!(err.status, 400);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn saved_observers_see_the_creating_flag() {
        let creates = Arc::new(AtomicUsize::new(0));
        let creates_clone = Arc::clone(&creates);

        let hooks = Hooks::new().on_saved(move |_, creating| {
            if creating {
                creates_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        let site = test_site();
        hooks.notify_saved(&site, true);
        hooks.notify_saved(&site, false);

        assert_eq!(creates.load(Ordering::SeqCst), 1);
    }

    fn test_site() -> Site {
        let now = chrono::Utc::now();
        Site {
            id: 1,
            network_id: 1,
            domain: "example.org".into(),
            path: "/".into(),
            registered: now,
            last_updated: now,
            public: 1,
            archived: 0,
            mature: 0,
            spam: 0,
            deleted: 0,
            lang_id: 0,
            blogname: String::new(),
            siteurl: "http://example.org/".into(),
            home: "http://example.org/".into(),
            post_count: 0,
        }
    }
}
