use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use huddle_shared::User;

use crate::api::AppState;
use crate::error::ServerError;

/// The account behind the request's `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ServerError::Unauthenticated)?;

        let account = state
            .config
            .account_for_token(token)
            .ok_or(ServerError::Unauthenticated)?;

        Ok(AuthUser(account.user.clone()))
    }
}
