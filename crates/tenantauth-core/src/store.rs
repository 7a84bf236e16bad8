//! Collaborator contracts for configuration and user persistence.
//!
//! The sign-in core never owns persisted state. Provider configurations and user accounts are
//! read and written through these traits, which the embedding application implements on top of
//! its database. Every call is tenant-scoped.

use crate::error::Result;
use crate::provider::ProviderConfig;
use crate::user::User;
use crate::uuid::{TenantId, UserId};

/// Read access to directory provider configurations.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProviderConfigStore: Send + Sync {
    /// Fetch the configuration for a provider key.
    ///
    /// Returns `Ok(None)` if the tenant has no such provider.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreError`] if the store cannot be read.
    async fn get_provider_config(
        &self,
        tenant: TenantId,
        provider: &str,
    ) -> Result<Option<ProviderConfig>>;

    /// List every configuration of the tenant in ascending internal id order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreError`] if the store cannot be read.
    async fn list_provider_configs(&self, tenant: TenantId) -> Result<Vec<ProviderConfig>>;
}

/// Lookup and registration of local user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Find the user linked to `(provider, uid)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreError`] if the store cannot be read.
    async fn find_by_provider_identity(
        &self,
        tenant: TenantId,
        provider: &str,
        uid: &str,
    ) -> Result<Option<User>>;

    /// Find a user by email, compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreError`] if the store cannot be read.
    async fn find_by_email(&self, tenant: TenantId, email: &str) -> Result<Option<User>>;

    /// Persist a new user together with its provider links, as one write.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PersistenceFailure`] if nothing was written.
    async fn register_user(&self, user: &User) -> Result<()>;

    /// Link `(provider, uid)` to an existing user, replacing any link the user already has for
    /// the same provider key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PersistenceFailure`] if nothing was written.
    async fn attach_provider_identity(&self, user: UserId, provider: &str, uid: &str)
        -> Result<()>;
}
