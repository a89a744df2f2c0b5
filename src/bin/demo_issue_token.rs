//! Stand-alone demonstration of the authorization core wired end to end with
//! the in-memory reference adapters: registers a client and a user, then
//! drives the Password grant, introspection and revocation by hand.
//!
//! Not a production entry point — there is no HTTP layer bound here. Run
//! with `cargo run --bin demo_issue_token`.

use std::process;
use std::sync::Arc;

use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::RsaPrivateKey;
use rust_oauth_authority::crypto::{PasswordHasher, TokenSigner};
use rust_oauth_authority::deadline::Deadline;
use rust_oauth_authority::model::{Client, GrantType, User};
use rust_oauth_authority::store::{
    InMemoryAuthCodeRepository, InMemoryClientRepository, InMemoryIntrospectionCache,
    InMemoryRevokedTokenRepository, InMemoryUserRepository,
};
use rust_oauth_authority::{GrantRequest, ServerConfig, TokenService};

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(e) = run().await {
        eprintln!("demo failed: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), anyhow::Error> {
    let mut rng = rand::rngs::OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, 2048)?;
    let public_key = rsa::RsaPublicKey::from(&private_key);
    let private_pem = private_key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)?.to_string().into_bytes();
    let public_pem = public_key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)?.into_bytes();

    let config = ServerConfig::new("https://auth.example.test", private_pem.clone(), public_pem.clone());
    let signer = TokenSigner::new(
        &config.issuer,
        &private_pem,
        &public_pem,
        config.jwt_kid.clone(),
        chrono::Duration::zero(),
    )?;

    let users = InMemoryUserRepository::new();
    let clients = InMemoryClientRepository::new();

    let hasher = PasswordHasher::new(config.bcrypt_cost);
    let user = User::new("alice", "alice@example.test", hasher.hash("correct horse battery staple")?);
    users.insert(user.clone()).await;

    let client = Client::new(
        hasher.hash("demo-client-secret")?,
        "Demo CLI Client",
        vec![GrantType::Password, GrantType::RefreshToken],
        vec!["read".to_string(), "write".to_string()],
    );
    clients.insert(client.clone()).await;

    let service = TokenService::new(
        &config,
        signer,
        Arc::new(users),
        Arc::new(clients),
        Arc::new(InMemoryAuthCodeRepository::new()),
        Arc::new(InMemoryRevokedTokenRepository::new()),
        Arc::new(InMemoryIntrospectionCache::new()),
    );

    let tokens = service
        .issue(
            GrantRequest::Password {
                client_id: client.id,
                client_secret: "demo-client-secret".to_string(),
                username: "alice".to_string(),
                password: "correct horse battery staple".to_string(),
                scope: Some("read".to_string()),
            },
            Deadline::none(),
        )
        .await?;

    println!("issued access token: {}", tokens.access_token);
    println!("issued refresh token: {}", tokens.refresh_token.as_deref().unwrap_or("<none>"));

    let introspection = service.introspect(&tokens.access_token, Deadline::none()).await;
    println!("introspection (before revoke): {}", serde_json::to_string(&introspection)?);

    service
        .revoke(client.id, "demo-client-secret", &tokens.access_token, Deadline::none())
        .await?;

    let introspection_after = service.introspect(&tokens.access_token, Deadline::none()).await;
    println!("introspection (after revoke): {}", serde_json::to_string(&introspection_after)?);

    Ok(())
}
