use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        auth::ExternalIdentity,
        user::{SyncUserRequest, UpdateUserRequest, User},
    },
};

pub struct UserService;

impl UserService {
    /// Mirrors an identity-provider account locally.
    ///
    /// Matching is by email first so that a placeholder created by an
    /// invitation gets linked to the real external id on first login; then by
    /// external id (the email changed upstream); otherwise a new row is made.
    /// Profile fields are only overwritten when the caller supplies them.
    pub async fn sync(
        pool: &PgPool,
        identity: &ExternalIdentity,
        req: &SyncUserRequest,
    ) -> ApiResult<User> {
        let name = req.name.as_ref().or(identity.name.as_ref());

        if let Some(existing) = Self::find_by_email(pool, &identity.email).await? {
            if existing.is_placeholder() {
                tracing::info!(user_id = %existing.id, "linking invited user to identity provider");
            } else if existing.external_id != identity.external_id {
                return Err(ApiError::Conflict(
                    "Email is linked to another account".into(),
                ));
            }

            let user = sqlx::query_as::<_, User>(
                "UPDATE users SET
                   external_id = $2,
                   name        = COALESCE($3, name),
                   avatar_url  = COALESCE($4, avatar_url),
                   updated_at  = NOW()
                 WHERE id = $1
                 RETURNING *",
            )
            .bind(existing.id)
            .bind(&identity.external_id)
            .bind(name)
            .bind(&req.avatar_url)
            .fetch_one(pool)
            .await?;
            return Ok(user);
        }

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (external_id, email, name, avatar_url)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (external_id) DO UPDATE SET
               email      = EXCLUDED.email,
               name       = COALESCE(EXCLUDED.name, users.name),
               avatar_url = COALESCE(EXCLUDED.avatar_url, users.avatar_url),
               updated_at = NOW()
             RETURNING *",
        )
        .bind(&identity.external_id)
        .bind(&identity.email)
        .bind(name)
        .bind(&req.avatar_url)
        .fetch_one(pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> ApiResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::NotFound("User"))
    }

    pub async fn update(pool: &PgPool, id: Uuid, req: &UpdateUserRequest) -> ApiResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET
               name         = COALESCE($2, name),
               bio          = COALESCE($3, bio),
               skills       = COALESCE($4, skills),
               availability = COALESCE($5, availability),
               updated_at   = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.bio)
        .bind(&req.skills)
        .bind(req.availability.as_ref().map(Json))
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound("User"))
    }
}
