//! The Password grant (§4.8).

use crate::deadline::Deadline;
use crate::error::TokenServiceError;
use crate::model::{GrantType, TokenResponse};

use super::{issue_pair, resolve_scope, GrantDeps};

pub async fn handle(
    deps: &GrantDeps,
    client_id: uuid::Uuid,
    client_secret: &str,
    username: &str,
    password: &str,
    scope: Option<&str>,
    deadline: Deadline,
) -> Result<TokenResponse, TokenServiceError> {
    let client = deps
        .client_auth
        .authenticate(client_id, client_secret, GrantType::Password, deadline)
        .await?;

    let user = deps.user_auth.authenticate(username, password, deadline).await?;

    let granted_scope = resolve_scope(&client, scope)?;

    let (response, _access_jti, _refresh_jti) =
        issue_pair(deps, &user.id.to_string(), &client.id.to_string(), &granted_scope)?;

    Ok(response)
}
