//! Directory sessions and the `ldap3` connector.

use crate::config::ConnectionTarget;
use crate::error::DirectoryError;
use async_trait::async_trait;
use ldap3::{
    DerefAliases, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry, SearchOptions,
};
use native_tls::TlsConnector;
use std::collections::HashMap;
use tenantauth_core::provider::SearchScope;
use tracing::debug;

/// Attribute list requesting no attributes at all (RFC 4511 section 4.5.1.8).
pub const NO_ATTRIBUTES: &str = "1.1";

/// A directory entry returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LdapEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute values keyed by attribute name.
    pub attributes: HashMap<String, Vec<String>>,
}

impl LdapEntry {
    /// Create an entry without attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add a value to an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Returns the first value of the attribute if present.
    ///
    /// Attribute names are case-insensitive, so an exact match is tried first and any
    /// differently cased name second.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .get(attribute)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
                    .map(|(_, values)| values)
            })
            .and_then(|values| values.first().map(String::as_str))
    }
}

/// One open connection to a directory server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapSession: Send {
    /// Simple bind; a non-success result code is [`DirectoryError::Bind`].
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<(), DirectoryError>;

    /// Search below `base_dn`, returning every entry.
    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[String],
    ) -> Result<Vec<LdapEntry>, DirectoryError>;

    /// Close the session.
    async fn unbind(&mut self) -> Result<(), DirectoryError>;
}

/// Opens sessions to directory servers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapConnector: Send + Sync {
    /// Dial the target, completing TLS or STARTTLS before returning.
    async fn connect(&self, target: &ConnectionTarget)
        -> Result<Box<dyn LdapSession>, DirectoryError>;
}

/// Connector backed by `ldap3` and `native-tls`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ldap3Connector;

impl Ldap3Connector {
    /// Creates a new connector instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LdapConnector for Ldap3Connector {
    async fn connect(
        &self,
        target: &ConnectionTarget,
    ) -> Result<Box<dyn LdapSession>, DirectoryError> {
        let settings = build_ldap_settings(target)?;
        let (conn, ldap) = LdapConnAsync::with_settings(settings, target.url())
            .await
            .map_err(|err| classify_connect_error(target, &err))?;

        let url = target.url().to_string();
        tokio::spawn(async move {
            if let Err(err) = conn.drive().await {
                debug!(url = %url, error = %err, "directory connection closed with error");
            }
        });

        Ok(Box::new(Ldap3Session { inner: ldap }))
    }
}

struct Ldap3Session {
    inner: ldap3::Ldap,
}

#[async_trait]
impl LdapSession for Ldap3Session {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<(), DirectoryError> {
        self.inner
            .simple_bind(dn, password)
            .await
            .map_err(|err| session_error(err, DirectoryError::Protocol))?
            .success()
            .map_err(|err| DirectoryError::Bind(err.to_string()))?;
        Ok(())
    }

    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[String],
    ) -> Result<Vec<LdapEntry>, DirectoryError> {
        let options = SearchOptions::new()
            .deref(DerefAliases::Never)
            .sizelimit(0)
            .timelimit(0);
        let (entries, _) = self
            .inner
            .with_search_options(options)
            .search(base_dn, ldap_scope(scope), filter, attributes.to_vec())
            .await
            .map_err(|err| session_error(err, DirectoryError::Search))?
            .success()
            .map_err(|err| DirectoryError::Search(err.to_string()))?;

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(|entry| LdapEntry {
                dn: entry.dn,
                attributes: entry.attrs,
            })
            .collect())
    }

    async fn unbind(&mut self) -> Result<(), DirectoryError> {
        self.inner
            .unbind()
            .await
            .map_err(|err| session_error(err, DirectoryError::Protocol))
    }
}

/// Failures of the connection itself become [`DirectoryError::Transport`]; anything else is
/// reported through `other`.
fn session_error(err: LdapError, other: fn(String) -> DirectoryError) -> DirectoryError {
    match err {
        LdapError::Io { .. }
        | LdapError::OpSend { .. }
        | LdapError::ResultRecv { .. }
        | LdapError::IdScrubSend { .. }
        | LdapError::MiscSend { .. }
        | LdapError::Timeout { .. }
        | LdapError::EndOfStream => DirectoryError::Transport(err.to_string()),
        _ => other(err.to_string()),
    }
}

/// Stored scope codes map one-to-one onto protocol scopes.
const fn ldap_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::BaseObject => Scope::Base,
        SearchScope::SingleLevel => Scope::OneLevel,
        SearchScope::WholeSubtree => Scope::Subtree,
    }
}

fn build_ldap_settings(target: &ConnectionTarget) -> Result<LdapConnSettings, DirectoryError> {
    let mut settings = LdapConnSettings::new()
        .set_conn_timeout(target.connect_timeout())
        .set_starttls(target.starttls());

    if !target.tls_verify() {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|err| {
                DirectoryError::Tls(format!("failed to construct TLS connector: {err}"))
            })?;
        settings = settings.set_connector(connector).set_no_tls_verify(true);
    }

    Ok(settings)
}

fn classify_connect_error(target: &ConnectionTarget, err: &LdapError) -> DirectoryError {
    let message = format!("{}: {err}", target.url());
    match err {
        LdapError::Io { .. } | LdapError::Timeout { .. } => DirectoryError::Dial(message),
        _ if target.starttls() => DirectoryError::StartTls(message),
        _ => DirectoryError::Dial(message),
    }
}
