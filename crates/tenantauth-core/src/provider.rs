//! Directory provider configuration.
//!
//! A [`ProviderConfig`] is stored per tenant and read-only from the sign-in core's point of view.
//! The persisted representation uses numeric codes for status, protocol and scope; every code
//! is mapped through an explicit table so an unknown value is rejected instead of shifted into
//! a neighbouring variant.

use crate::error::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU16;

/// Serialized placeholder that replaces the bind password.
pub const REDACTED_PASSWORD: &str = "password will remain secret";

/// Whether a provider is offered for public sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProviderStatus {
    /// Configured but hidden from sign-in
    Disabled,
    /// Offered for sign-in
    Enabled,
}

/// Transport used to reach the directory server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Protocol {
    /// Plaintext LDAP
    Plain,
    /// Plaintext LDAP upgraded with STARTTLS before any bind
    StartTls,
    /// LDAP over implicit TLS
    Ldaps,
}

/// Search scope applied below the configured root DN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SearchScope {
    /// The root DN entry only
    BaseObject,
    /// Direct children of the root DN
    SingleLevel,
    /// The root DN and everything below it
    WholeSubtree,
}

macro_rules! stored_code {
    ($name:ident, $what:literal, { $($variant:ident = $code:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the persisted numeric code.
            #[must_use]
            pub const fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = Error;

            fn try_from(code: u8) -> Result<Self> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    other => Err(Error::ValidationError(format!(
                        concat!("invalid ", $what, " code: {}"),
                        other
                    ))),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                value.code()
            }
        }
    };
}

stored_code!(ProviderStatus, "provider status", { Disabled = 1, Enabled = 2 });
stored_code!(Protocol, "protocol", { Plain = 1, StartTls = 2, Ldaps = 3 });
stored_code!(SearchScope, "search scope", { BaseObject = 1, SingleLevel = 2, WholeSubtree = 3 });

impl Protocol {
    /// URL scheme used to dial the server. STARTTLS dials plaintext first.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Plain | Self::StartTls => "ldap",
            Self::Ldaps => "ldaps",
        }
    }
}

/// Configuration of one directory provider for one tenant.
///
/// The bind password is held as a [`SecretString`]: `Debug` redacts it and serialization
/// replaces it with [`REDACTED_PASSWORD`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Internal id; the store lists configurations in ascending id order
    pub id: u64,
    /// Stable provider key (slug), unique per tenant
    pub provider: String,
    /// Name shown on the sign-in page
    pub display_name: String,
    /// Enabled or disabled for sign-in
    pub status: ProviderStatus,
    /// Connection protocol
    pub protocol: Protocol,
    /// Whether the server certificate is verified
    pub cert_check: bool,
    /// Directory server host name
    pub hostname: String,
    /// Directory server port
    #[serde(with = "port_text")]
    pub port: NonZeroU16,
    /// Service account DN used for searches
    pub bind_username: String,
    /// Service account password
    #[serde(
        serialize_with = "redact_password",
        deserialize_with = "secret_from_string"
    )]
    pub bind_password: SecretString,
    /// Search root (base DN)
    #[serde(rename = "rootDN")]
    pub root_dn: String,
    /// Search scope
    pub scope: SearchScope,
    /// Filter template every user search is conjoined with, e.g. `(objectClass=inetOrgPerson)`
    pub user_search_filter: String,
    /// Attribute holding the login name and stable directory id
    #[serde(rename = "usernameLdapAttribute")]
    pub username_attribute: String,
    /// Attribute holding the display name
    #[serde(rename = "nameLdapAttribute")]
    pub name_attribute: String,
    /// Attribute holding the email address
    #[serde(rename = "mailLdapAttribute")]
    pub mail_attribute: String,
}

impl ProviderConfig {
    /// Returns true if the provider is offered for sign-in.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status == ProviderStatus::Enabled
    }

    /// The three attributes a profile lookup requests, in id, name, mail order.
    #[must_use]
    pub fn profile_attributes(&self) -> Vec<String> {
        vec![
            self.username_attribute.clone(),
            self.name_attribute.clone(),
            self.mail_attribute.clone(),
        ]
    }
}

impl Clone for ProviderConfig {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            provider: self.provider.clone(),
            display_name: self.display_name.clone(),
            status: self.status,
            protocol: self.protocol,
            cert_check: self.cert_check,
            hostname: self.hostname.clone(),
            port: self.port,
            bind_username: self.bind_username.clone(),
            bind_password: SecretString::from(self.bind_password.expose_secret().to_owned()),
            root_dn: self.root_dn.clone(),
            scope: self.scope,
            user_search_filter: self.user_search_filter.clone(),
            username_attribute: self.username_attribute.clone(),
            name_attribute: self.name_attribute.clone(),
            mail_attribute: self.mail_attribute.clone(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("display_name", &self.display_name)
            .field("status", &self.status)
            .field("protocol", &self.protocol)
            .field("cert_check", &self.cert_check)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("bind_username", &self.bind_username)
            .field("bind_password", &REDACTED_PASSWORD)
            .field("root_dn", &self.root_dn)
            .field("scope", &self.scope)
            .field("user_search_filter", &self.user_search_filter)
            .field("username_attribute", &self.username_attribute)
            .field("name_attribute", &self.name_attribute)
            .field("mail_attribute", &self.mail_attribute)
            .finish()
    }
}

/// Public-safe summary of a provider, used for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOption {
    /// Provider key
    pub provider: String,
    /// Display name
    pub display_name: String,
    /// Whether the provider is offered for sign-in
    pub is_enabled: bool,
}

impl From<&ProviderConfig> for ProviderOption {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            provider: config.provider.clone(),
            display_name: config.display_name.clone(),
            is_enabled: config.is_enabled(),
        }
    }
}

/// Parses a port given as text.
///
/// # Errors
///
/// Returns [`Error::ValidationError`] unless the text is an integer in `1..=65535`.
pub fn parse_port(text: &str) -> Result<NonZeroU16> {
    text.trim()
        .parse::<NonZeroU16>()
        .map_err(|_| Error::ValidationError(format!("invalid port: {text}")))
}

fn redact_password<S: Serializer>(
    _: &SecretString,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(REDACTED_PASSWORD)
}

fn secret_from_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

mod port_text {
    use super::parse_port;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::num::NonZeroU16;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Text(String),
        Number(u64),
    }

    pub(super) fn serialize<S: Serializer>(
        port: &NonZeroU16,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(port)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NonZeroU16, D::Error> {
        match RawPort::deserialize(deserializer)? {
            RawPort::Text(text) => parse_port(&text).map_err(de::Error::custom),
            RawPort::Number(number) => u16::try_from(number)
                .ok()
                .and_then(NonZeroU16::new)
                .ok_or_else(|| de::Error::custom(format!("invalid port: {number}"))),
        }
    }
}
