//! The Client Credentials grant (§4.8). No refresh token is ever issued.

use crate::deadline::Deadline;
use crate::error::TokenServiceError;
use crate::model::{GrantType, TokenResponse};

use super::{issue_access_only, resolve_scope, GrantDeps};

pub async fn handle(
    deps: &GrantDeps,
    client_id: uuid::Uuid,
    client_secret: &str,
    scope: Option<&str>,
    deadline: Deadline,
) -> Result<TokenResponse, TokenServiceError> {
    let client = deps
        .client_auth
        .authenticate(client_id, client_secret, GrantType::ClientCredentials, deadline)
        .await?;

    let granted_scope = resolve_scope(&client, scope)?;

    issue_access_only(deps, &client.id.to_string(), &client.id.to_string(), &granted_scope)
}
