use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::error::ApiError;
use crate::models::auth::{AuthenticatedUser, Claims, ExternalIdentity};
use crate::AppState;

impl FromRequestParts<AppState> for ExternalIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid Authorization header format"))?;

        decode_session_token(token, &state.config.auth_jwt_secret)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token"))
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = ExternalIdentity::from_request_parts(parts, state).await?;

        let user_id: Option<uuid::Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE external_id = $1")
                .bind(&identity.external_id)
                .fetch_optional(&state.db)
                .await?;

        let user_id = user_id.ok_or(ApiError::Unauthorized("User not synced"))?;

        Ok(AuthenticatedUser {
            user_id,
            external_id: identity.external_id,
            email: identity.email,
        })
    }
}

pub fn decode_session_token(token: &str, secret: &str) -> Result<ExternalIdentity, anyhow::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation)?;
    let claims = data.claims;

    if claims.sub.is_empty() {
        anyhow::bail!("token has an empty subject");
    }

    Ok(ExternalIdentity {
        external_id: claims.sub,
        email: claims.email,
        name: claims.name,
    })
}
