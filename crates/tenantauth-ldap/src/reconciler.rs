//! Mapping a verified directory profile onto a local user account.

use crate::profile::DirectoryProfile;
use serde::Serialize;
use std::sync::Arc;
use tenantauth_core::store::UserStore;
use tenantauth_core::user::{Tenant, User};
use tenantauth_core::{Error, Result};
use tracing::{info, warn};

/// How the signed-in user was found or created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "user", rename_all = "snake_case")]
pub enum Reconciliation {
    /// The provider identity was already linked
    Existing(User),
    /// An account with the same email got the provider identity attached
    Linked(User),
    /// A new visitor account was registered
    Registered(User),
}

impl Reconciliation {
    /// The resulting user.
    #[must_use]
    pub const fn user(&self) -> &User {
        match self {
            Self::Existing(user) | Self::Linked(user) | Self::Registered(user) => user,
        }
    }

    /// Consume into the resulting user.
    #[must_use]
    pub fn into_user(self) -> User {
        match self {
            Self::Existing(user) | Self::Linked(user) | Self::Registered(user) => user,
        }
    }
}

/// Finds, links or registers the local account for a directory identity.
#[derive(Clone)]
pub struct IdentityReconciler {
    users: Arc<dyn UserStore>,
}

impl IdentityReconciler {
    /// Create a reconciler over a user store.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Resolve the local user for `profile` signed in through `provider`.
    ///
    /// Lookup order is provider identity, then email. A private tenant never auto-registers.
    /// Each branch performs at most one write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInvited`] for an unknown user of a private tenant,
    /// [`Error::PersistenceFailure`] if the write fails, and propagates store read failures.
    pub async fn reconcile(
        &self,
        tenant: &Tenant,
        provider: &str,
        profile: &DirectoryProfile,
    ) -> Result<Reconciliation> {
        if let Some(user) = self
            .users
            .find_by_provider_identity(tenant.id, provider, &profile.id)
            .await?
        {
            info!(provider, user_id = %user.id, "directory identity already linked");
            return Ok(Reconciliation::Existing(user));
        }

        if !profile.email.is_empty() {
            if let Some(mut user) = self.users.find_by_email(tenant.id, &profile.email).await? {
                if let Some(previous) = user.provider_uid(provider) {
                    warn!(
                        provider,
                        user_id = %user.id,
                        previous_uid = previous,
                        "replacing provider identity linked to the same email"
                    );
                }
                self.users
                    .attach_provider_identity(user.id, provider, &profile.id)
                    .await
                    .map_err(into_persistence_failure)?;
                user.link_provider(provider, profile.id.as_str());
                info!(provider, user_id = %user.id, "linked directory identity by email");
                return Ok(Reconciliation::Linked(user));
            }
        }

        if tenant.is_private {
            info!(provider, tenant = %tenant.id, "unknown directory user on private tenant");
            return Err(Error::NotInvited);
        }

        let name = if profile.name.is_empty() {
            profile.id.as_str()
        } else {
            profile.name.as_str()
        };
        let user = User::new(tenant.id, name, profile.email.as_str())
            .with_provider(provider, profile.id.as_str());
        self.users
            .register_user(&user)
            .await
            .map_err(into_persistence_failure)?;
        info!(provider, user_id = %user.id, "registered user from directory profile");
        Ok(Reconciliation::Registered(user))
    }
}

fn into_persistence_failure(err: Error) -> Error {
    match err {
        Error::PersistenceFailure(_) => err,
        other => Error::PersistenceFailure(other.to_string()),
    }
}
