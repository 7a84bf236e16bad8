//! Tenant and user entities consumed by the sign-in core.

use serde::{Deserialize, Serialize};

use crate::uuid::{TenantId, UserId};

/// A tenant and the policy flags sign-in reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant identifier
    pub id: TenantId,
    /// Tenant name
    pub name: String,
    /// Only invited users may sign up
    #[serde(default)]
    pub is_private: bool,
}

impl Tenant {
    /// Create a public tenant.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TenantId::new_v4(),
            name: name.into(),
            is_private: false,
        }
    }

    /// Set whether the tenant only accepts invited users.
    #[must_use]
    pub const fn with_private(mut self, is_private: bool) -> Self {
        self.is_private = is_private;
        self
    }
}

/// Role of a local user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Lowest privilege, assigned to self-registered users
    #[default]
    Visitor,
    /// Staff member
    Collaborator,
    /// Tenant administrator
    Administrator,
}

/// A provider identity linked to a local user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserProvider {
    /// Provider key
    pub name: String,
    /// Provider-side unique id
    pub uid: String,
}

impl UserProvider {
    /// Create a provider link.
    #[must_use]
    pub fn new(name: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: uid.into(),
        }
    }
}

/// A local user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Local account id
    pub id: UserId,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Display name
    pub name: String,
    /// Email address (may be empty for provider-only accounts)
    pub email: String,
    /// Role within the tenant
    pub role: Role,
    /// Linked provider identities, at most one per provider key
    #[serde(default)]
    pub providers: Vec<UserProvider>,
}

impl User {
    /// Create a visitor with no linked providers.
    #[must_use]
    pub fn new(tenant_id: TenantId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new_v4(),
            tenant_id,
            name: name.into(),
            email: email.into(),
            role: Role::Visitor,
            providers: Vec::new(),
        }
    }

    /// Set the role.
    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Add a provider link, replacing any existing link for the same provider key.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>, uid: impl Into<String>) -> Self {
        self.link_provider(provider, uid);
        self
    }

    /// Link a provider identity, replacing any existing link for the same provider key.
    pub fn link_provider(&mut self, provider: impl Into<String>, uid: impl Into<String>) {
        let link = UserProvider::new(provider, uid);
        self.providers.retain(|existing| existing.name != link.name);
        self.providers.push(link);
    }

    /// Returns true if the user has a link for the provider key.
    #[must_use]
    pub fn has_provider(&self, provider: &str) -> bool {
        self.providers.iter().any(|p| p.name == provider)
    }

    /// Returns the provider-side id linked under the provider key.
    #[must_use]
    pub fn provider_uid(&self, provider: &str) -> Option<&str> {
        self.providers
            .iter()
            .find(|p| p.name == provider)
            .map(|p| p.uid.as_str())
    }

    /// Returns true if the user administers the tenant.
    #[must_use]
    pub const fn is_administrator(&self) -> bool {
        matches!(self.role, Role::Administrator)
    }
}
