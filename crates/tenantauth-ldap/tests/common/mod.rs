//! Shared helpers for the sign-in integration tests.
//!
//! `FakeDirectory` is a scripted in-process directory server: it answers binds and searches
//! from a fixed set of entries and counts the sessions it hands out.

#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tenantauth_core::config::DirectorySettings;
use tenantauth_core::memory::{InMemoryProviderConfigStore, InMemoryUserStore};
use tenantauth_core::provider::{ProviderConfig, SearchScope};
use tenantauth_core::user::Tenant;
use tenantauth_ldap::{
    ConnectionTarget, DirectoryAuthService, DirectoryError, LdapConnector, LdapEntry, LdapSession,
    RequestContext, NO_ATTRIBUTES,
};

pub const SERVICE_DN: &str = "cn=readonly,dc=example,dc=org";
pub const SERVICE_PASSWORD: &str = "readonly_password";

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load the stored provider configurations fixture.
pub fn load_providers() -> Vec<ProviderConfig> {
    let path = fixtures_dir().join("providers.json");
    let json = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture at {}: {}", path.display(), e));
    serde_json::from_str(&json)
        .unwrap_or_else(|e| panic!("Failed to deserialize provider fixture: {e}"))
}

/// A directory entry with its password.
#[derive(Debug, Clone)]
pub struct FakeEntry {
    pub dn: String,
    pub password: String,
    pub attributes: Vec<(String, String)>,
}

impl FakeEntry {
    pub fn person(uid: &str, name: &str, mail: &str, password: &str) -> Self {
        Self {
            dn: format!("uid={uid},dc=example,dc=org"),
            password: password.to_string(),
            attributes: vec![
                ("objectClass".to_string(), "inetOrgPerson".to_string()),
                ("uid".to_string(), uid.to_string()),
                ("displayName".to_string(), name.to_string()),
                ("mail".to_string(), mail.to_string()),
            ],
        }
    }

    fn values(&self, attribute: &str) -> impl Iterator<Item = &str> {
        let attribute = attribute.to_string();
        self.attributes
            .iter()
            .filter(move |(name, _)| name.eq_ignore_ascii_case(&attribute))
            .map(|(_, value)| value.as_str())
    }

    fn to_ldap_entry(&self, requested: &[String]) -> LdapEntry {
        let mut entry = LdapEntry::new(self.dn.clone());
        for attribute in requested.iter().filter(|a| a.as_str() != NO_ATTRIBUTES) {
            for (name, value) in &self.attributes {
                if name.eq_ignore_ascii_case(attribute) {
                    entry = entry.with_attribute(name.clone(), value.clone());
                }
            }
        }
        entry
    }
}

#[derive(Default)]
struct Shared {
    entries: Mutex<Vec<FakeEntry>>,
    unreachable: AtomicBool,
    latency: Mutex<Duration>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    binds: Mutex<Vec<String>>,
    filters: Mutex<Vec<String>>,
    urls: Mutex<Vec<String>>,
}

/// Scripted directory server.
#[derive(Clone, Default)]
pub struct FakeDirectory {
    shared: Arc<Shared>,
}

impl FakeDirectory {
    pub fn new(entries: Vec<FakeEntry>) -> Self {
        let directory = Self::default();
        *directory.shared.entries.lock().unwrap() = entries;
        directory
    }

    /// The directory most tests use: `developer` plus two entries sharing a uid.
    pub fn example_org() -> Self {
        Self::new(vec![
            FakeEntry::person(
                "developer",
                "Developer Name",
                "developer@example.org",
                "developer_password",
            ),
            FakeEntry::person("twin", "Twin One", "twin1@example.org", "twin_password"),
            FakeEntry {
                dn: "uid=twin,ou=archive,dc=example,dc=org".to_string(),
                ..FakeEntry::person("twin", "Twin Two", "twin2@example.org", "twin_password")
            },
        ])
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.shared.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.shared.latency.lock().unwrap() = latency;
    }

    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn binds(&self) -> Vec<String> {
        self.shared.binds.lock().unwrap().clone()
    }

    pub fn filters(&self) -> Vec<String> {
        self.shared.filters.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.shared.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LdapConnector for FakeDirectory {
    async fn connect(
        &self,
        target: &ConnectionTarget,
    ) -> Result<Box<dyn LdapSession>, DirectoryError> {
        self.shared.urls.lock().unwrap().push(target.url().to_string());

        let latency = *self.shared.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.shared.unreachable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Dial(format!(
                "{}: connection refused",
                target.url()
            )));
        }

        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            shared: self.shared.clone(),
        }))
    }
}

struct FakeSession {
    shared: Arc<Shared>,
}

#[async_trait]
impl LdapSession for FakeSession {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<(), DirectoryError> {
        self.shared.binds.lock().unwrap().push(dn.to_string());

        if dn == SERVICE_DN && password == SERVICE_PASSWORD {
            return Ok(());
        }
        let entries = self.shared.entries.lock().unwrap();
        let accepted = entries
            .iter()
            .any(|e| e.dn == dn && !password.is_empty() && e.password == password);
        if accepted {
            Ok(())
        } else {
            Err(DirectoryError::Bind("invalidCredentials (49)".to_string()))
        }
    }

    async fn search(
        &mut self,
        _base_dn: &str,
        _scope: SearchScope,
        filter: &str,
        attributes: &[String],
    ) -> Result<Vec<LdapEntry>, DirectoryError> {
        self.shared.filters.lock().unwrap().push(filter.to_string());

        let (attribute, pattern) = last_equality_clause(filter)
            .ok_or_else(|| DirectoryError::Search(format!("unsupported filter {filter}")))?;
        let entries = self.shared.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|e| e.values(&attribute).any(|value| pattern.matches(value)))
            .map(|e| e.to_ldap_entry(attributes))
            .collect())
    }

    async fn unbind(&mut self) -> Result<(), DirectoryError> {
        self.shared.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Value of an equality assertion; unescaped `*` acts as a substring wildcard like on a real
/// server.
struct Pattern {
    parts: Vec<String>,
}

impl Pattern {
    fn parse(raw: &str) -> Self {
        Self {
            parts: raw.split('*').map(unescape).collect(),
        }
    }

    fn matches(&self, value: &str) -> bool {
        match self.parts.as_slice() {
            [literal] => literal == value,
            [first, .., last] => {
                value.len() >= first.len() + last.len()
                    && value.starts_with(first.as_str())
                    && value.ends_with(last.as_str())
            }
            [] => false,
        }
    }
}

fn last_equality_clause(filter: &str) -> Option<(String, Pattern)> {
    let start = filter.rfind('(')?;
    let clause = filter[start + 1..].trim_end_matches(')');
    let (attribute, value) = clause.split_once('=')?;
    Some((attribute.to_string(), Pattern::parse(value)))
}

fn unescape(raw: &str) -> String {
    let mut out = String::new();
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let hex: String = chars.by_ref().take(2).collect();
            if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                out.push(char::from(byte));
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// A service wired to the fixture providers, a fresh user store and `directory`.
pub struct Harness {
    pub service: DirectoryAuthService,
    pub directory: FakeDirectory,
    pub users: Arc<InMemoryUserStore>,
    pub tenant: Tenant,
}

impl Harness {
    pub async fn new(tenant: Tenant, directory: FakeDirectory) -> Self {
        Self::with_settings(tenant, directory, DirectorySettings::default()).await
    }

    pub async fn with_settings(
        tenant: Tenant,
        directory: FakeDirectory,
        settings: DirectorySettings,
    ) -> Self {
        let configs = InMemoryProviderConfigStore::new();
        for config in load_providers() {
            configs.upsert(tenant.id, config).await;
        }
        let users = Arc::new(InMemoryUserStore::new());
        let service = DirectoryAuthService::with_connector(
            Arc::new(configs),
            users.clone(),
            settings,
            Box::new(directory.clone()),
        )
        .unwrap();

        Self {
            service,
            directory,
            users,
            tenant,
        }
    }

    pub fn ctx(&self) -> RequestContext {
        RequestContext::new(self.tenant.clone())
    }
}
