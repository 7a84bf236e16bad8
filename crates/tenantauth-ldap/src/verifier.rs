//! Credential verification: service bind, user lookup, user bind.

use crate::connector::{LdapEntry, LdapSession, NO_ATTRIBUTES};
use crate::context::OperationBudget;
use crate::error::DirectoryError;
use ldap3::ldap_escape;
use secrecy::ExposeSecret;
use tenantauth_core::provider::ProviderConfig;

/// Build the search filter for a username.
///
/// The username is escaped per RFC 4515 so that filter metacharacters in user input match
/// literally. A template without enclosing parentheses is wrapped in them.
#[must_use]
pub fn build_user_filter(config: &ProviderConfig, username: &str) -> String {
    let clause = format!(
        "({}={})",
        config.username_attribute.trim(),
        ldap_escape(username)
    );

    let template = config.user_search_filter.trim();
    if template.is_empty() {
        return clause;
    }

    if template.starts_with('(') && template.ends_with(')') {
        format!("(&{template}{clause})")
    } else {
        format!("(&({template}){clause})")
    }
}

/// Bind with the provider's service account.
pub(crate) async fn service_bind(
    session: &mut dyn LdapSession,
    config: &ProviderConfig,
    budget: &OperationBudget,
) -> Result<(), DirectoryError> {
    budget
        .run(
            "service bind",
            session.simple_bind(&config.bind_username, config.bind_password.expose_secret()),
        )
        .await
        .map_err(DirectoryError::at_service_bind)
}

/// Search for the entry of `username`, requiring exactly one match.
pub(crate) async fn find_single_entry(
    session: &mut dyn LdapSession,
    config: &ProviderConfig,
    username: &str,
    attributes: &[String],
    budget: &OperationBudget,
) -> Result<LdapEntry, DirectoryError> {
    let filter = build_user_filter(config, username);
    let mut entries = budget
        .run(
            "search",
            session.search(&config.root_dn, config.scope, &filter, attributes),
        )
        .await?;

    if entries.len() == 1 {
        Ok(entries.remove(0))
    } else {
        Err(DirectoryError::UserNotFound {
            matches: entries.len(),
        })
    }
}

/// Verify `password` for `username` on an open session.
///
/// The session ends up bound as the user on success. An empty password never reaches the
/// server, since an empty simple bind is an unauthenticated bind that most servers accept.
pub(crate) async fn verify_credentials(
    session: &mut dyn LdapSession,
    config: &ProviderConfig,
    username: &str,
    password: &str,
    budget: &OperationBudget,
) -> Result<(), DirectoryError> {
    if password.is_empty() {
        return Err(DirectoryError::UserBind("empty password".to_string()));
    }

    service_bind(session, config, budget).await?;

    let attributes = [NO_ATTRIBUTES.to_string()];
    let entry = find_single_entry(session, config, username, &attributes, budget).await?;

    budget
        .run("user bind", session.simple_bind(&entry.dn, password))
        .await
        .map_err(DirectoryError::at_user_bind)
}
