use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims of the identity-provider session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // external (identity-provider) user id
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
}

/// Verified identity, before any local user lookup.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
}

/// Verified identity resolved to a local user record.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub external_id: String,
    pub email: String,
}
