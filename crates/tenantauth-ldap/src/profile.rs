//! Directory profile lookup.

use crate::connector::{LdapEntry, LdapSession};
use crate::context::OperationBudget;
use crate::error::DirectoryError;
use crate::verifier::{find_single_entry, service_bind};
use serde::Serialize;
use tenantauth_core::provider::ProviderConfig;

/// Identity attributes read from a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryProfile {
    /// Unique id within the provider, from the username attribute
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address, lower-cased; may be empty
    pub email: String,
}

impl DirectoryProfile {
    /// Create a profile with trimmed values and a lower-cased email.
    #[must_use]
    pub fn new(id: &str, name: &str, email: &str) -> Self {
        Self {
            id: id.trim().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
        }
    }

    /// Build the profile from a search entry using the configured attribute names.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::UserNotFound`] if the entry has no usable id value.
    pub fn from_entry(config: &ProviderConfig, entry: &LdapEntry) -> Result<Self, DirectoryError> {
        let profile = Self::new(
            entry.first(&config.username_attribute).unwrap_or_default(),
            entry.first(&config.name_attribute).unwrap_or_default(),
            entry.first(&config.mail_attribute).unwrap_or_default(),
        );

        if profile.id.is_empty() {
            return Err(DirectoryError::UserNotFound { matches: 0 });
        }
        Ok(profile)
    }
}

pub(crate) async fn fetch_profile(
    session: &mut dyn LdapSession,
    config: &ProviderConfig,
    username: &str,
    budget: &OperationBudget,
) -> Result<DirectoryProfile, DirectoryError> {
    service_bind(session, config, budget).await?;
    let entry = find_single_entry(
        session,
        config,
        username,
        &config.profile_attributes(),
        budget,
    )
    .await?;
    DirectoryProfile::from_entry(config, &entry)
}
