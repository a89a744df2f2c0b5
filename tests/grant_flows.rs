//! Integration tests driving whole grant flows against the in-memory
//! adapters, covering the concrete scenarios and invariants of the
//! specification's testable-properties section.

use std::sync::Arc;

use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::RsaPrivateKey;
use rust_oauth_authority::crypto::PasswordHasher;
use rust_oauth_authority::crypto::TokenSigner;
use rust_oauth_authority::deadline::Deadline;
use rust_oauth_authority::error::ErrorKind;
use rust_oauth_authority::model::{AuthorizationCode, Client, CodeChallengeMethod, GrantType, User};
use rust_oauth_authority::store::{
    AuthCodeRepository, InMemoryAuthCodeRepository, InMemoryClientRepository, InMemoryIntrospectionCache,
    InMemoryRevokedTokenRepository, InMemoryUserRepository,
};
use rust_oauth_authority::{GrantRequest, ServerConfig, TokenService};

struct Harness {
    service: TokenService,
    clients: InMemoryClientRepository,
    auth_codes: InMemoryAuthCodeRepository,
    hasher: PasswordHasher,
}

fn rsa_keypair() -> (Vec<u8>, Vec<u8>) {
    let mut rng = rand::rngs::OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
    let public_key = rsa::RsaPublicKey::from(&private_key);
    let private_pem = private_key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF).unwrap().to_string().into_bytes();
    let public_pem = public_key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF).unwrap().into_bytes();
    (private_pem, public_pem)
}

fn harness() -> Harness {
    let (private_pem, public_pem) = rsa_keypair();
    let config = ServerConfig::new("https://auth.example.test", private_pem.clone(), public_pem.clone());
    let signer = TokenSigner::new(&config.issuer, &private_pem, &public_pem, None, chrono::Duration::zero()).unwrap();

    let users = InMemoryUserRepository::new();
    let clients = InMemoryClientRepository::new();
    let auth_codes = InMemoryAuthCodeRepository::new();
    let hasher = PasswordHasher::new(config.bcrypt_cost);

    let service = TokenService::new(
        &config,
        signer,
        Arc::new(users),
        Arc::new(clients.clone()),
        Arc::new(auth_codes.clone()),
        Arc::new(InMemoryRevokedTokenRepository::new()),
        Arc::new(InMemoryIntrospectionCache::new()),
    );

    Harness { service, clients, auth_codes, hasher }
}

#[tokio::test]
async fn password_grant_happy_path_issues_access_and_refresh_tokens() {
    let h = harness();
    let user = User::new("alice", "alice@example.test", h.hasher.hash("hunter2").unwrap());
    // Register the user through a second handle to the same repository the
    // service holds; `harness()` only exposes clients/auth_codes, so build a
    // fresh service sharing a populated user repository here instead.
    let users = InMemoryUserRepository::new();
    users.insert(user.clone()).await;

    let client = Client::new(
        h.hasher.hash("s3cret").unwrap(),
        "Web App",
        vec![GrantType::Password],
        vec!["read".to_string(), "write".to_string()],
    );
    h.clients.insert(client.clone()).await;

    let (private_pem, public_pem) = rsa_keypair();
    let config = ServerConfig::new("https://auth.example.test", private_pem.clone(), public_pem.clone());
    let signer = TokenSigner::new(&config.issuer, &private_pem, &public_pem, None, chrono::Duration::zero()).unwrap();
    let service = TokenService::new(
        &config,
        signer,
        Arc::new(users),
        Arc::new(h.clients.clone()),
        Arc::new(h.auth_codes.clone()),
        Arc::new(InMemoryRevokedTokenRepository::new()),
        Arc::new(InMemoryIntrospectionCache::new()),
    );

    let response = service
        .issue(
            GrantRequest::Password {
                client_id: client.id,
                client_secret: "s3cret".to_string(),
                username: "alice".to_string(),
                password: "hunter2".to_string(),
                scope: Some("read".to_string()),
            },
            Deadline::none(),
        )
        .await
        .unwrap();

    assert!(response.refresh_token.is_some());
    assert_eq!(response.scope, "read");

    let introspection = service.introspect(&response.access_token, Deadline::none()).await;
    assert!(introspection.is_active());

    let _ = h.service.jwk_set();
}

#[tokio::test]
async fn authorization_code_grant_with_s256_pkce_full_flow() {
    let h = harness();
    let mut client = Client::new(
        h.hasher.hash("s3cret").unwrap(),
        "SPA",
        vec![GrantType::AuthorizationCode],
        vec!["read".to_string()],
    );
    client.allowed_redirect_uris.push("https://spa.example/callback".to_string());
    h.clients.insert(client.clone()).await;

    let user_id = uuid::Uuid::new_v4();
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    let challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    let code = AuthorizationCode {
        code: "abc123".to_string(),
        client_id: client.id,
        user_id,
        redirect_uri: "https://spa.example/callback".to_string(),
        scope: "read".to_string(),
        code_challenge: challenge.to_string(),
        code_challenge_method: CodeChallengeMethod::S256,
        expires_at: chrono::Utc::now() + chrono::Duration::minutes(10),
        consumed: false,
        issued_jtis: Vec::new(),
    };
    h.auth_codes.put(code, Deadline::none()).await.unwrap();

    let response = h
        .service
        .issue(
            GrantRequest::AuthorizationCode {
                client_id: client.id,
                client_secret: "s3cret".to_string(),
                code: "abc123".to_string(),
                redirect_uri: "https://spa.example/callback".to_string(),
                code_verifier: verifier.to_string(),
            },
            Deadline::none(),
        )
        .await
        .unwrap();

    assert!(response.refresh_token.is_some());

    // Replaying the same code must fail.
    let replay = h
        .service
        .issue(
            GrantRequest::AuthorizationCode {
                client_id: client.id,
                client_secret: "s3cret".to_string(),
                code: "abc123".to_string(),
                redirect_uri: "https://spa.example/callback".to_string(),
                code_verifier: verifier.to_string(),
            },
            Deadline::none(),
        )
        .await
        .unwrap_err();
    assert_eq!(replay.kind, ErrorKind::InvalidGrant);

    // And the tokens from the first (legitimate) exchange are now revoked.
    let introspection = h.service.introspect(&response.access_token, Deadline::none()).await;
    assert!(!introspection.is_active());
}

#[tokio::test]
async fn mismatched_redirect_uri_is_rejected() {
    let h = harness();
    let client = Client::new(
        h.hasher.hash("s3cret").unwrap(),
        "SPA",
        vec![GrantType::AuthorizationCode],
        vec!["read".to_string()],
    );
    h.clients.insert(client.clone()).await;

    let code = AuthorizationCode {
        code: "xyz".to_string(),
        client_id: client.id,
        user_id: uuid::Uuid::new_v4(),
        redirect_uri: "https://spa.example/callback".to_string(),
        scope: "read".to_string(),
        code_challenge: "whatever".to_string(),
        code_challenge_method: CodeChallengeMethod::Plain,
        expires_at: chrono::Utc::now() + chrono::Duration::minutes(10),
        consumed: false,
        issued_jtis: Vec::new(),
    };
    h.auth_codes.put(code, Deadline::none()).await.unwrap();

    let err = h
        .service
        .issue(
            GrantRequest::AuthorizationCode {
                client_id: client.id,
                client_secret: "s3cret".to_string(),
                code: "xyz".to_string(),
                redirect_uri: "https://attacker.example/callback".to_string(),
                code_verifier: "x".repeat(43),
            },
            Deadline::none(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidGrant);
}

#[tokio::test]
async fn refresh_rotation_invalidates_the_old_refresh_token() {
    let h = harness();
    let client = Client::new(
        h.hasher.hash("s3cret").unwrap(),
        "Worker",
        vec![GrantType::ClientCredentials, GrantType::RefreshToken, GrantType::Password],
        vec!["read".to_string()],
    );
    h.clients.insert(client.clone()).await;

    let users = InMemoryUserRepository::new();
    let user = User::new("bob", "bob@example.test", h.hasher.hash("pw").unwrap());
    users.insert(user.clone()).await;

    let (private_pem, public_pem) = rsa_keypair();
    let config = ServerConfig::new("https://auth.example.test", private_pem.clone(), public_pem.clone());
    let signer = TokenSigner::new(&config.issuer, &private_pem, &public_pem, None, chrono::Duration::zero()).unwrap();
    let service = TokenService::new(
        &config,
        signer,
        Arc::new(users),
        Arc::new(h.clients.clone()),
        Arc::new(h.auth_codes.clone()),
        Arc::new(InMemoryRevokedTokenRepository::new()),
        Arc::new(InMemoryIntrospectionCache::new()),
    );

    let first = service
        .issue(
            GrantRequest::Password {
                client_id: client.id,
                client_secret: "s3cret".to_string(),
                username: "bob".to_string(),
                password: "pw".to_string(),
                scope: None,
            },
            Deadline::none(),
        )
        .await
        .unwrap();
    let old_refresh = first.refresh_token.clone().unwrap();

    let rotated = service
        .issue(
            GrantRequest::RefreshToken {
                client_id: client.id,
                client_secret: "s3cret".to_string(),
                refresh_token: old_refresh.clone(),
                scope: None,
            },
            Deadline::none(),
        )
        .await
        .unwrap();
    assert_ne!(rotated.access_token, first.access_token);

    let introspection = service.introspect(&old_refresh, Deadline::none()).await;
    assert!(!introspection.is_active());

    let reuse = service
        .issue(
            GrantRequest::RefreshToken {
                client_id: client.id,
                client_secret: "s3cret".to_string(),
                refresh_token: old_refresh,
                scope: None,
            },
            Deadline::none(),
        )
        .await
        .unwrap_err();
    assert_eq!(reuse.kind, ErrorKind::InvalidGrant);
}

#[tokio::test]
async fn client_credentials_grant_never_returns_a_refresh_token() {
    let h = harness();
    let client = Client::new(
        h.hasher.hash("s3cret").unwrap(),
        "Backend Service",
        vec![GrantType::ClientCredentials],
        vec!["read".to_string(), "write".to_string()],
    );
    h.clients.insert(client.clone()).await;

    let response = h
        .service
        .issue(
            GrantRequest::ClientCredentials {
                client_id: client.id,
                client_secret: "s3cret".to_string(),
                scope: Some("write".to_string()),
            },
            Deadline::none(),
        )
        .await
        .unwrap();

    assert!(response.refresh_token.is_none());
}

#[tokio::test]
async fn wrong_grant_for_client_is_rejected() {
    let h = harness();
    let client = Client::new(
        h.hasher.hash("s3cret").unwrap(),
        "Read Only Service",
        vec![GrantType::ClientCredentials],
        vec!["read".to_string()],
    );
    h.clients.insert(client.clone()).await;

    let err = h
        .service
        .issue(
            GrantRequest::Password {
                client_id: client.id,
                client_secret: "s3cret".to_string(),
                username: "nobody".to_string(),
                password: "pw".to_string(),
                scope: None,
            },
            Deadline::none(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnauthorizedClient);
}

#[tokio::test]
async fn scope_escalation_beyond_client_allowance_is_rejected() {
    let h = harness();
    let client = Client::new(
        h.hasher.hash("s3cret").unwrap(),
        "Limited Client",
        vec![GrantType::ClientCredentials],
        vec!["read".to_string()],
    );
    h.clients.insert(client.clone()).await;

    let err = h
        .service
        .issue(
            GrantRequest::ClientCredentials {
                client_id: client.id,
                client_secret: "s3cret".to_string(),
                scope: Some("read write admin".to_string()),
            },
            Deadline::none(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidScope);
}

#[tokio::test]
async fn revoking_an_unknown_token_still_reports_success() {
    let h = harness();
    let client = Client::new(
        h.hasher.hash("s3cret").unwrap(),
        "App",
        vec![GrantType::ClientCredentials],
        vec!["read".to_string()],
    );
    h.clients.insert(client.clone()).await;

    h.service
        .revoke(client.id, "s3cret", "not-a-real-jwt", Deadline::none())
        .await
        .unwrap();
}
