use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        member::{MemberRole, MemberStatus},
        tenant::{
            CreateTenantRequest, Tenant, UpdateTenantRequest, DEFAULT_ACCENT_COLOR,
            DEFAULT_PRIMARY_COLOR,
        },
    },
};

pub struct TenantService;

impl TenantService {
    pub async fn list(pool: &PgPool) -> ApiResult<Vec<Tenant>> {
        let tenants = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(tenants)
    }

    pub async fn get_by_slug(pool: &PgPool, slug: &str) -> ApiResult<Tenant> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::NotFound("Tenant"))
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> ApiResult<Tenant> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::NotFound("Tenant"))
    }

    /// Creates the tenant and makes `creator_id` its first active admin.
    pub async fn create(
        pool: &PgPool,
        req: &CreateTenantRequest,
        creator_id: Uuid,
    ) -> ApiResult<Tenant> {
        let mut tx = pool.begin().await?;

        let tenant = sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (slug, name, logo, primary_color, accent_color)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (slug) DO NOTHING
             RETURNING *",
        )
        .bind(&req.slug)
        .bind(&req.name)
        .bind(&req.logo)
        .bind(req.primary_color.as_deref().unwrap_or(DEFAULT_PRIMARY_COLOR))
        .bind(req.accent_color.as_deref().unwrap_or(DEFAULT_ACCENT_COLOR))
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::Conflict("Tenant slug already exists".into()))?;

        sqlx::query(
            "INSERT INTO tenant_members (tenant_id, user_id, role, status)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(tenant.id)
        .bind(creator_id)
        .bind(MemberRole::Admin)
        .bind(MemberStatus::Active)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(tenant = %tenant.slug, "tenant created");
        Ok(tenant)
    }

    pub async fn update(pool: &PgPool, id: Uuid, req: &UpdateTenantRequest) -> ApiResult<Tenant> {
        sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET
               name          = COALESCE($2, name),
               logo          = CASE WHEN $3 THEN NULL ELSE COALESCE($4, logo) END,
               primary_color = COALESCE($5, primary_color),
               accent_color  = COALESCE($6, accent_color),
               terminology   = COALESCE($7, terminology),
               features      = COALESCE($8, features),
               updated_at    = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&req.name)
        .bind(req.remove_logo)
        .bind(&req.logo)
        .bind(&req.primary_color)
        .bind(&req.accent_color)
        .bind(req.terminology.as_ref().map(Json))
        .bind(req.features.as_ref().map(Json))
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound("Tenant"))
    }

    /// Members, opportunities and signups go with it (FK cascades).
    pub async fn delete(pool: &PgPool, id: Uuid) -> ApiResult<()> {
        let deleted = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ApiError::NotFound("Tenant"));
        }
        tracing::info!(tenant_id = %id, "tenant deleted");
        Ok(())
    }
}
