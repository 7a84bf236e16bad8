//! Sign-in facade over the directory components.

use crate::catalog::ProviderCatalog;
use crate::config::ConnectionTarget;
use crate::connector::{Ldap3Connector, LdapConnector, LdapSession};
use crate::context::{OperationBudget, RequestContext};
use crate::error::{report, DirectoryError};
use crate::profile::{fetch_profile, DirectoryProfile};
use crate::reconciler::{IdentityReconciler, Reconciliation};
use crate::verifier::{service_bind, verify_credentials};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tenantauth_core::config::DirectorySettings;
use tenantauth_core::provider::{ProviderConfig, ProviderOption};
use tenantauth_core::store::{ProviderConfigStore, UserStore};
use tenantauth_core::user::User;
use tenantauth_core::{Error, Result};
use tracing::{debug, instrument};
use validator::{Validate, ValidationErrors};

/// Credentials submitted on the sign-in form.
#[derive(Clone, Deserialize, Validate)]
pub struct SignInRequest {
    /// Provider key
    #[validate(length(min = 1, message = "Provider is required."))]
    #[serde(default)]
    pub provider: String,
    /// Username as typed
    #[validate(length(min = 1, message = "Username is required."))]
    #[serde(default)]
    pub username: String,
    /// Password as typed
    #[validate(length(min = 1, message = "Password is required."))]
    #[serde(default)]
    pub password: String,
}

impl SignInRequest {
    /// Create a request.
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Validate the form, reporting the username first, then the password, then the provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] naming the first missing field.
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|errors| Error::ValidationError(first_message(&errors)))
    }
}

impl fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInRequest")
            .field("provider", &self.provider)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn first_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    ["username", "password", "provider"]
        .iter()
        .filter_map(|field| fields.get(*field))
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(ToString::to_string))
        .unwrap_or_else(|| errors.to_string())
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutcome {
    /// Profile read from the directory
    pub profile: DirectoryProfile,
    /// How the local account was resolved
    pub reconciliation: Reconciliation,
}

impl SignInOutcome {
    /// The signed-in user.
    #[must_use]
    pub const fn user(&self) -> &User {
        self.reconciliation.user()
    }

    /// Consume into the signed-in user.
    #[must_use]
    pub fn into_user(self) -> User {
        self.reconciliation.into_user()
    }
}

/// An open session together with the configuration it was opened for.
struct OpenSession {
    session: Box<dyn LdapSession>,
    config: ProviderConfig,
    url: String,
}

/// Directory sign-in service.
///
/// Holds no per-request state; one instance serves every tenant.
pub struct DirectoryAuthService {
    configs: Arc<dyn ProviderConfigStore>,
    catalog: ProviderCatalog,
    reconciler: IdentityReconciler,
    connector: Box<dyn LdapConnector>,
    settings: DirectorySettings,
}

impl DirectoryAuthService {
    /// Create a service that dials directories with `ldap3`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the settings are out of range.
    pub fn new(
        configs: Arc<dyn ProviderConfigStore>,
        users: Arc<dyn UserStore>,
        settings: DirectorySettings,
    ) -> Result<Self> {
        Self::with_connector(configs, users, settings, Box::new(Ldap3Connector::new()))
    }

    /// Create a service with a custom connector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the settings are out of range.
    pub fn with_connector(
        configs: Arc<dyn ProviderConfigStore>,
        users: Arc<dyn UserStore>,
        settings: DirectorySettings,
        connector: Box<dyn LdapConnector>,
    ) -> Result<Self> {
        settings.ensure_valid()?;
        Ok(Self {
            catalog: ProviderCatalog::new(configs.clone()),
            reconciler: IdentityReconciler::new(users),
            configs,
            connector,
            settings,
        })
    }

    /// Returns the active settings.
    #[must_use]
    pub const fn settings(&self) -> &DirectorySettings {
        &self.settings
    }

    /// Open a session to the provider's directory server.
    ///
    /// The caller owns the session and must unbind it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationNotFound`] for an unknown provider key and
    /// [`Error::ConnectionFailed`] if the server cannot be reached.
    pub async fn connect(
        &self,
        ctx: &RequestContext,
        provider: &str,
    ) -> Result<(Box<dyn LdapSession>, ProviderConfig)> {
        let open = self.open(ctx, provider).await?;
        Ok((open.session, open.config))
    }

    /// Check that the provider is reachable and accepts its service account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationNotFound`] for an unknown provider key and
    /// [`Error::ConnectionFailed`] for any dial or service bind failure.
    #[instrument(skip_all, fields(tenant = %ctx.tenant.id, provider = %provider))]
    pub async fn test_provider(&self, ctx: &RequestContext, provider: &str) -> Result<()> {
        let mut open = self.open(ctx, provider).await?;
        let budget = self.budget(ctx);

        let outcome = service_bind(open.session.as_mut(), &open.config, &budget).await;
        let url = open.url.clone();
        close(open, &budget).await;

        outcome.map_err(|err| {
            report(provider, &url, &err);
            err.into_check_failure(provider)
        })?;
        debug!("directory provider reachable");
        Ok(())
    }

    /// Verify a username and password against the provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] for an unknown, ambiguous or wrongly authenticated
    /// user, [`Error::ConfigurationNotFound`] for an unknown provider key and
    /// [`Error::ConnectionFailed`] if the server cannot be reached in time.
    #[instrument(skip_all, fields(tenant = %ctx.tenant.id, provider = %provider))]
    pub async fn verify(
        &self,
        ctx: &RequestContext,
        provider: &str,
        username: &str,
        password: &str,
    ) -> Result<()> {
        if username.trim().is_empty() || password.is_empty() {
            debug!("empty username or password");
            return Err(Error::InvalidCredentials);
        }

        let mut open = self.open(ctx, provider).await?;
        let budget = self.budget(ctx);

        let outcome = verify_credentials(
            open.session.as_mut(),
            &open.config,
            username,
            password,
            &budget,
        )
        .await;
        let url = open.url.clone();
        close(open, &budget).await;

        outcome.map_err(|err| collapse(provider, &url, err))
    }

    /// Read the directory profile of a username.
    ///
    /// # Errors
    ///
    /// Same as [`Self::verify`]; no unique entry is [`Error::InvalidCredentials`].
    #[instrument(skip_all, fields(tenant = %ctx.tenant.id, provider = %provider))]
    pub async fn get_profile(
        &self,
        ctx: &RequestContext,
        provider: &str,
        username: &str,
    ) -> Result<DirectoryProfile> {
        let mut open = self.open(ctx, provider).await?;
        let budget = self.budget(ctx);

        let outcome = fetch_profile(open.session.as_mut(), &open.config, username, &budget).await;
        let url = open.url.clone();
        close(open, &budget).await;

        outcome.map_err(|err| collapse(provider, &url, err))
    }

    /// Verify the submitted credentials and resolve the local user.
    ///
    /// An unknown provider key is reported as [`Error::InvalidCredentials`], like any other
    /// credential failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] for missing fields, [`Error::InvalidCredentials`],
    /// [`Error::ConnectionFailed`], [`Error::NotInvited`] for an unknown user of a private
    /// tenant and [`Error::PersistenceFailure`] if the account could not be written.
    #[instrument(skip_all, fields(tenant = %ctx.tenant.id, provider = %request.provider))]
    pub async fn sign_in(
        &self,
        ctx: &RequestContext,
        request: &SignInRequest,
    ) -> Result<SignInOutcome> {
        request.check()?;
        let provider = request.provider.as_str();

        self.verify(ctx, provider, &request.username, &request.password)
            .await
            .map_err(hide_unknown_provider)?;
        let profile = self
            .get_profile(ctx, provider, &request.username)
            .await
            .map_err(hide_unknown_provider)?;
        let reconciliation = self
            .reconciler
            .reconcile(&ctx.tenant, provider, &profile)
            .await?;

        Ok(SignInOutcome {
            profile,
            reconciliation,
        })
    }

    /// Providers offered on the sign-in page.
    ///
    /// # Errors
    ///
    /// Propagates store read failures.
    pub async fn list_active_providers(&self, ctx: &RequestContext) -> Result<Vec<ProviderOption>> {
        self.catalog.list_active(ctx.tenant.id).await
    }

    /// Every configured provider, enabled or not.
    ///
    /// # Errors
    ///
    /// Propagates store read failures.
    pub async fn list_all_providers(&self, ctx: &RequestContext) -> Result<Vec<ProviderOption>> {
        self.catalog.list_all(ctx.tenant.id).await
    }

    async fn open(&self, ctx: &RequestContext, provider: &str) -> Result<OpenSession> {
        let config = self
            .configs
            .get_provider_config(ctx.tenant.id, provider)
            .await?
            .ok_or_else(|| Error::ConfigurationNotFound(provider.to_string()))?;

        let target = ConnectionTarget::from_provider(&config, &self.settings).map_err(|err| {
            report(provider, &config.hostname, &err);
            err.into_public(provider)
        })?;

        let session = self
            .budget(ctx)
            .run("connect", self.connector.connect(&target))
            .await
            .map_err(|err| {
                report(provider, target.url(), &err);
                err.into_public(provider)
            })?;

        Ok(OpenSession {
            session,
            config,
            url: target.url().to_string(),
        })
    }

    fn budget(&self, ctx: &RequestContext) -> OperationBudget {
        OperationBudget::new(self.settings.operation_timeout(), ctx.deadline)
    }
}

async fn close(mut open: OpenSession, budget: &OperationBudget) {
    if let Err(err) = budget.run("unbind", open.session.unbind()).await {
        debug!(url = %open.url, error = %err, "unbind failed");
    }
}

fn collapse(provider: &str, url: &str, err: DirectoryError) -> Error {
    report(provider, url, &err);
    err.into_public(provider)
}

fn hide_unknown_provider(err: Error) -> Error {
    match err {
        Error::ConfigurationNotFound(_) => Error::InvalidCredentials,
        other => other,
    }
}
