//! Provider listing, connectivity checks and profile lookups.

mod common;

use common::{load_providers, FakeDirectory, Harness};
use tenantauth_core::provider::{Protocol, ProviderStatus, SearchScope, REDACTED_PASSWORD};
use tenantauth_core::user::Tenant;
use tenantauth_core::Error;
use tenantauth_ldap::{connection_url, DirectoryProfile, LdapSession};

#[test]
fn fixture_codes_decode() {
    let providers = load_providers();
    assert_eq!(providers.len(), 3);

    let ldap_test = &providers[0];
    assert_eq!(ldap_test.status, ProviderStatus::Enabled);
    assert_eq!(ldap_test.protocol, Protocol::Plain);
    assert_eq!(ldap_test.scope, SearchScope::WholeSubtree);

    let other = &providers[1];
    assert_eq!(other.status, ProviderStatus::Disabled);
    assert_eq!(other.protocol, Protocol::Ldaps);
    assert_eq!(other.scope, SearchScope::SingleLevel);
    assert_eq!(other.port.get(), 636);

    assert_eq!(providers[2].protocol, Protocol::StartTls);
}

#[test]
fn fixture_urls_follow_protocol() {
    let urls: Vec<String> = load_providers()
        .iter()
        .map(|config| connection_url(config).unwrap().to_string())
        .collect();
    assert_eq!(
        urls,
        vec![
            "ldap://localhost:389",
            "ldaps://ldap.example.org:636",
            "ldap://dc01.corp.example.org:389",
        ]
    );
}

#[test]
fn serialized_config_never_contains_bind_password() {
    for config in load_providers() {
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(REDACTED_PASSWORD));
        assert!(!json.contains("readonly_password"));
        assert!(!json.contains("admin_password"));
        assert!(!json.contains("svc_password"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("readonly_password"));
        assert!(!debug.contains("svc_password"));
    }
}

#[tokio::test]
async fn active_providers_are_an_ordered_subset() {
    let harness = Harness::new(Tenant::new("demo"), FakeDirectory::example_org()).await;
    let ctx = harness.ctx();

    let all = harness.service.list_all_providers(&ctx).await.unwrap();
    let active = harness.service.list_active_providers(&ctx).await.unwrap();

    let all_keys: Vec<_> = all.iter().map(|o| o.provider.as_str()).collect();
    let active_keys: Vec<_> = active.iter().map(|o| o.provider.as_str()).collect();
    assert_eq!(all_keys, vec!["ldap_test", "other_ldap", "corp_directory"]);
    assert_eq!(active_keys, vec!["ldap_test", "corp_directory"]);
    assert!(active.iter().all(|o| o.is_enabled));
    assert_eq!(all[1].display_name, "Second Ldap Server");
    assert!(!all[1].is_enabled);

    // A store holding only another tenant's providers lists nothing for this one.
    let other_tenant = Harness::new(Tenant::new("other"), FakeDirectory::default()).await;
    assert_eq!(
        other_tenant
            .service
            .list_all_providers(&ctx)
            .await
            .unwrap()
            .len(),
        0
    );
}

#[tokio::test]
async fn connect_hands_out_a_session_the_caller_closes() {
    let harness = Harness::new(Tenant::new("demo"), FakeDirectory::example_org()).await;
    let ctx = harness.ctx();

    let (mut session, config) = harness.service.connect(&ctx, "corp_directory").await.unwrap();
    assert_eq!(config.provider, "corp_directory");
    assert_eq!(config.protocol, Protocol::StartTls);
    assert_eq!(
        harness.directory.urls(),
        vec!["ldap://dc01.corp.example.org:389".to_string()]
    );
    assert_eq!(harness.directory.opened(), 1);
    assert_eq!(harness.directory.closed(), 0);

    session.unbind().await.unwrap();
    assert_eq!(harness.directory.closed(), 1);

    let missing = harness.service.connect(&ctx, "incorrect_provider").await.err();
    assert_eq!(
        missing,
        Some(Error::ConfigurationNotFound("incorrect_provider".to_string()))
    );
    assert_eq!(harness.directory.opened(), 1);
}

#[tokio::test]
async fn connectivity_check_succeeds_with_valid_service_account() {
    let harness = Harness::new(Tenant::new("demo"), FakeDirectory::example_org()).await;

    harness
        .service
        .test_provider(&harness.ctx(), "ldap_test")
        .await
        .unwrap();

    assert_eq!(harness.directory.opened(), 1);
    assert_eq!(harness.directory.closed(), 1);
    assert_eq!(
        harness.directory.urls(),
        vec!["ldap://localhost:389".to_string()]
    );
    assert!(harness.directory.filters().is_empty());
}

#[tokio::test]
async fn connectivity_check_rejected_service_account_is_connection_failed() {
    let harness = Harness::new(Tenant::new("demo"), FakeDirectory::example_org()).await;

    // corp_directory binds with a DN the fake directory does not know.
    let err = harness
        .service
        .test_provider(&harness.ctx(), "corp_directory")
        .await
        .unwrap_err();

    assert_eq!(err, Error::ConnectionFailed("corp_directory".to_string()));
    assert_eq!(harness.directory.closed(), 1);
}

#[tokio::test]
async fn connectivity_check_unknown_provider_is_not_found() {
    let harness = Harness::new(Tenant::new("demo"), FakeDirectory::example_org()).await;

    let err = harness
        .service
        .test_provider(&harness.ctx(), "incorrect_provider")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::ConfigurationNotFound("incorrect_provider".to_string())
    );
    assert_eq!(harness.directory.opened(), 0);
}

#[tokio::test]
async fn connectivity_check_unreachable_directory() {
    let directory = FakeDirectory::example_org();
    directory.set_unreachable(true);
    let harness = Harness::new(Tenant::new("demo"), directory).await;

    let err = harness
        .service
        .test_provider(&harness.ctx(), "ldap_test")
        .await
        .unwrap_err();
    assert_eq!(err, Error::ConnectionFailed("ldap_test".to_string()));
}

#[tokio::test]
async fn profile_lookup_returns_normalized_attributes() {
    let harness = Harness::new(Tenant::new("demo"), FakeDirectory::example_org()).await;

    let profile = harness
        .service
        .get_profile(&harness.ctx(), "ldap_test", "developer")
        .await
        .unwrap();

    assert_eq!(
        profile,
        DirectoryProfile::new("developer", "Developer Name", "developer@example.org")
    );
    assert_eq!(harness.directory.opened(), 1);
    assert_eq!(harness.directory.closed(), 1);
}

#[tokio::test]
async fn profile_lookup_requires_exactly_one_entry() {
    let harness = Harness::new(Tenant::new("demo"), FakeDirectory::example_org()).await;
    let ctx = harness.ctx();

    assert_eq!(
        harness
            .service
            .get_profile(&ctx, "ldap_test", "nobody")
            .await,
        Err(Error::InvalidCredentials)
    );
    assert_eq!(
        harness.service.get_profile(&ctx, "ldap_test", "twin").await,
        Err(Error::InvalidCredentials)
    );
    assert_eq!(
        harness
            .service
            .get_profile(&ctx, "missing", "developer")
            .await,
        Err(Error::ConfigurationNotFound("missing".to_string()))
    );
}
