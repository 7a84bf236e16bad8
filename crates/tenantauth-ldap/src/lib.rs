//! LDAP sign-in for multi-tenant applications.
//!
//! Verifies a username and password against a tenant's directory provider, reads the user's
//! directory profile, and maps it onto a local account: an already linked identity, an account
//! with the same email, or a newly registered visitor.
//!
//! Every attempt dials the directory afresh. Failures are logged with operator detail and
//! surfaced as the coarse [`tenantauth_core::Error`] taxonomy, so an unknown user and a wrong
//! password look the same to the caller.

#![deny(missing_docs)]

mod catalog;
mod config;
mod connector;
mod context;
mod error;
mod profile;
mod reconciler;
mod service;
mod verifier;

pub use catalog::ProviderCatalog;
pub use config::{connection_url, ConnectionTarget};
pub use connector::{Ldap3Connector, LdapConnector, LdapEntry, LdapSession, NO_ATTRIBUTES};
pub use context::RequestContext;
pub use error::DirectoryError;
pub use profile::DirectoryProfile;
pub use reconciler::{IdentityReconciler, Reconciliation};
pub use service::{DirectoryAuthService, SignInOutcome, SignInRequest};
pub use verifier::build_user_filter;

/// Convenient result alias that reuses the core error type.
pub type Result<T> = tenantauth_core::Result<T>;
