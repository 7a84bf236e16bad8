//! Provider listings for sign-in pages and administration.

use std::sync::Arc;
use tenantauth_core::provider::ProviderOption;
use tenantauth_core::store::ProviderConfigStore;
use tenantauth_core::uuid::TenantId;
use tenantauth_core::Result;

/// Lists the directory providers of a tenant.
#[derive(Clone)]
pub struct ProviderCatalog {
    configs: Arc<dyn ProviderConfigStore>,
}

impl ProviderCatalog {
    /// Create a catalog over a configuration store.
    #[must_use]
    pub fn new(configs: Arc<dyn ProviderConfigStore>) -> Self {
        Self { configs }
    }

    /// Every configured provider, in store order.
    ///
    /// # Errors
    ///
    /// Propagates store read failures.
    pub async fn list_all(&self, tenant: TenantId) -> Result<Vec<ProviderOption>> {
        let configs = self.configs.list_provider_configs(tenant).await?;
        Ok(configs.iter().map(ProviderOption::from).collect())
    }

    /// Enabled providers only, in store order.
    ///
    /// # Errors
    ///
    /// Propagates store read failures.
    pub async fn list_active(&self, tenant: TenantId) -> Result<Vec<ProviderOption>> {
        let mut options = self.list_all(tenant).await?;
        options.retain(|option| option.is_enabled);
        Ok(options)
    }
}
