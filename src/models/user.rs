use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;
use validator::Validate;

/// Prefix of `external_id` for users invited by email who never signed in.
pub const PENDING_EXTERNAL_ID_PREFIX: &str = "pending_";

/// Local mirror of an identity-provider account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    /// Day name to list of time slots, e.g. `{"saturday": ["morning"]}`.
    pub availability: Json<BTreeMap<String, Vec<String>>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_placeholder(&self) -> bool {
        self.external_id.starts_with(PENDING_EXTERNAL_ID_PREFIX)
    }
}

pub fn placeholder_external_id(email: &str) -> String {
    format!("{PENDING_EXTERNAL_ID_PREFIX}{email}")
}

/// Profile fields a client may push on login; identity comes from the token.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SyncUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub availability: Option<BTreeMap<String, Vec<String>>>,
}

/// Compact user shape embedded in member and signup listings.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_ids_are_recognised() {
        let id = placeholder_external_id("ada@example.org");
        assert_eq!(id, "pending_ada@example.org");
        assert!(id.starts_with(PENDING_EXTERNAL_ID_PREFIX));
    }

    #[test]
    fn bio_is_capped() {
        let req = UpdateUserRequest {
            bio: Some("x".repeat(501)),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
