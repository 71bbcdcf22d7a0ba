//! Capability model for network administration.
//!
//! Permission checks are delegated to an [`Authorizer`] working from an
//! explicit [`RequestContext`] threaded through each operation, instead of
//! ambient current-user globals.

use crate::site::Site;
use crate::types::DbId;

/// Administrative capabilities checked by the sites controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Read and edit sites across the network.
    ManageSites,
    /// Provision new sites.
    CreateSites,
    /// Remove sites from the network.
    DeleteSites,
}

/// Identity and scope for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: DbId,
    /// Role name carried by the access token (e.g. `"admin"`).
    pub role: String,
    /// Network scope new sites land in when the request names none.
    pub network_id: DbId,
}

/// Permission predicate collaborator.
pub trait Authorizer: Send + Sync {
    /// Whether the user holds the given capability.
    fn user_can(&self, ctx: &RequestContext, cap: Capability) -> bool;

    /// Per-row read predicate for list results. Rows failing this check are
    /// dropped from the response without adjusting the reported total.
    fn can_read_site(&self, ctx: &RequestContext, _site: &Site) -> bool {
        self.user_can(ctx, Capability::ManageSites)
    }
}

/// Role-table authorizer: `admin` holds every capability, `manager` can
/// manage existing sites but neither provision nor delete them.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizer;

impl Authorizer for RoleAuthorizer {
    fn user_can(&self, ctx: &RequestContext, cap: Capability) -> bool {
        match ctx.role.as_str() {
            "admin" => true,
            "manager" => matches!(cap, Capability::ManageSites),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: &str) -> RequestContext {
        RequestContext {
            user_id: 7,
            role: role.to_string(),
            network_id: 1,
        }
    }

    #[test]
    fn admin_holds_every_capability() {
        let auth = RoleAuthorizer;
        for cap in [
            Capability::ManageSites,
            Capability::CreateSites,
            Capability::DeleteSites,
        ] {
            assert!(auth.user_can(&ctx("admin"), cap));
        }
    }

    #[test]
    fn manager_only_manages() {
        let auth = RoleAuthorizer;
        assert!(auth.user_can(&ctx("manager"), Capability::ManageSites));
        assert!(!auth.user_can(&ctx("manager"), Capability::CreateSites));
        assert!(!auth.user_can(&ctx("manager"), Capability::DeleteSites));
    }

    #[test]
    fn unknown_role_holds_nothing() {
        let auth = RoleAuthorizer;
        assert!(!auth.user_can(&ctx("subscriber"), Capability::ManageSites));
    }
}
