//! In-memory store implementations.
//!
//! Useful for tests and single-process embedding. Both stores keep insertion order and guard
//! their state with a tokio `RwLock`.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::provider::ProviderConfig;
use crate::store::{ProviderConfigStore, UserStore};
use crate::user::User;
use crate::uuid::{TenantId, UserId};

/// Provider configurations keyed by tenant.
#[derive(Debug, Default)]
pub struct InMemoryProviderConfigStore {
    configs: RwLock<HashMap<TenantId, Vec<ProviderConfig>>>,
}

impl InMemoryProviderConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the configuration with the same provider key.
    pub async fn upsert(&self, tenant: TenantId, config: ProviderConfig) {
        let mut configs = self.configs.write().await;
        let entries = configs.entry(tenant).or_default();
        entries.retain(|existing| existing.provider != config.provider);
        entries.push(config);
        entries.sort_by_key(|c| c.id);
    }
}

#[async_trait::async_trait]
impl ProviderConfigStore for InMemoryProviderConfigStore {
    async fn get_provider_config(
        &self,
        tenant: TenantId,
        provider: &str,
    ) -> Result<Option<ProviderConfig>> {
        let configs = self.configs.read().await;
        Ok(configs
            .get(&tenant)
            .and_then(|entries| entries.iter().find(|c| c.provider == provider))
            .cloned())
    }

    async fn list_provider_configs(&self, tenant: TenantId) -> Result<Vec<ProviderConfig>> {
        let configs = self.configs.read().await;
        Ok(configs.get(&tenant).cloned().unwrap_or_default())
    }
}

/// User accounts of every tenant.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user without going through registration.
    pub async fn insert(&self, user: User) {
        self.users.write().await.push(user);
    }

    /// Number of stored users across tenants.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Fetch a user by id.
    pub async fn get(&self, id: UserId) -> Option<User> {
        self.users.read().await.iter().find(|u| u.id == id).cloned()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_provider_identity(
        &self,
        tenant: TenantId,
        provider: &str,
        uid: &str,
    ) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.tenant_id == tenant && u.provider_uid(provider) == Some(uid))
            .cloned())
    }

    async fn find_by_email(&self, tenant: TenantId, email: &str) -> Result<Option<User>> {
        if email.is_empty() {
            return Ok(None);
        }
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.tenant_id == tenant && u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn register_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.id == user.id) {
            return Err(Error::PersistenceFailure(format!(
                "user {} already exists",
                user.id
            )));
        }
        users.push(user.clone());
        debug!(user_id = %user.id, tenant = %user.tenant_id, "user registered");
        Ok(())
    }

    async fn attach_provider_identity(
        &self,
        user: UserId,
        provider: &str,
        uid: &str,
    ) -> Result<()> {
        let mut users = self.users.write().await;
        let target = users
            .iter_mut()
            .find(|u| u.id == user)
            .ok_or_else(|| Error::PersistenceFailure(format!("user {user} does not exist")))?;
        target.link_provider(provider, uid);
        debug!(user_id = %user, provider, "provider identity attached");
        Ok(())
    }
}
