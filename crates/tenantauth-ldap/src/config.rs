//! Connection parameters derived from a provider configuration.

use crate::error::DirectoryError;
use std::time::Duration;
use tenantauth_core::config::DirectorySettings;
use tenantauth_core::provider::{Protocol, ProviderConfig};
use url::Url;

/// Everything a connector needs to dial one directory server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    provider: String,
    url: Url,
    starttls: bool,
    tls_verify: bool,
    connect_timeout: Duration,
}

impl ConnectionTarget {
    /// Derive the target for a provider.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::InvalidUrl`] if the host and port do not form a valid URL.
    pub fn from_provider(
        config: &ProviderConfig,
        settings: &DirectorySettings,
    ) -> Result<Self, DirectoryError> {
        Ok(Self {
            provider: config.provider.clone(),
            url: connection_url(config)?,
            starttls: config.protocol == Protocol::StartTls,
            tls_verify: config.cert_check,
            connect_timeout: settings.connect_timeout(),
        })
    }

    /// Provider key the target belongs to.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Returns the directory endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Whether the connection must be upgraded with STARTTLS before any bind.
    #[must_use]
    pub const fn starttls(&self) -> bool {
        self.starttls
    }

    /// Returns whether TLS certificate and host name verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Returns the dial timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Override the dial timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Build the endpoint URL: `ldaps://` for implicit TLS, `ldap://` otherwise.
///
/// # Errors
///
/// Returns [`DirectoryError::InvalidUrl`] for an empty or malformed host.
pub fn connection_url(config: &ProviderConfig) -> Result<Url, DirectoryError> {
    let host = config.hostname.trim();
    if host.is_empty() {
        return Err(DirectoryError::InvalidUrl("hostname is empty".to_string()));
    }

    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    };

    let raw = format!("{}://{host}:{}", config.protocol.scheme(), config.port);
    Url::parse(&raw).map_err(|err| DirectoryError::InvalidUrl(format!("{raw}: {err}")))
}
