use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        member::{
            InviteMemberRequest, ListMembersQuery, MemberRole, MemberStatus, MemberTenantRow,
            MemberUserRow, MemberWithUser, MembershipWithTenant, TenantMember,
            UpdateMemberRequest,
        },
        user::{placeholder_external_id, User},
        Page, Paginated,
    },
    services::users::UserService,
};

const MEMBER_USER_COLUMNS: &str = "m.*, u.email AS user_email, u.name AS user_name, u.avatar_url AS user_avatar_url";

pub struct MemberService;

impl MemberService {
    /// Role of the user in the tenant, if their membership is active.
    pub async fn active_role(
        pool: &PgPool,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> ApiResult<Option<MemberRole>> {
        let role = sqlx::query_scalar::<_, MemberRole>(
            "SELECT role FROM tenant_members
             WHERE tenant_id = $1 AND user_id = $2 AND status = 'active'",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(role)
    }

    pub async fn get(pool: &PgPool, tenant_id: Uuid, user_id: Uuid) -> ApiResult<MemberWithUser> {
        sqlx::query_as::<_, MemberUserRow>(&format!(
            "SELECT {MEMBER_USER_COLUMNS}
             FROM tenant_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.tenant_id = $1 AND m.user_id = $2"
        ))
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .map(MemberWithUser::from)
        .ok_or(ApiError::NotFound("Member"))
    }

    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        query: &ListMembersQuery,
    ) -> ApiResult<Paginated<MemberWithUser>> {
        let page = Page::new(query.limit, query.offset);
        let search = query.search.as_deref().map(|s| format!("%{}%", escape_like(s)));
        let filter = "m.tenant_id = $1
             AND ($2::member_role IS NULL OR m.role = $2)
             AND ($3::member_status IS NULL OR m.status = $3)
             AND ($4::text IS NULL OR u.name ILIKE $4 OR u.email ILIKE $4)";

        let list_sql = format!(
            "SELECT {MEMBER_USER_COLUMNS}
             FROM tenant_members m
             JOIN users u ON u.id = m.user_id
             WHERE {filter}
             ORDER BY m.created_at DESC
             LIMIT $5 OFFSET $6"
        );
        let count_sql = format!(
            "SELECT COUNT(*) FROM tenant_members m
             JOIN users u ON u.id = m.user_id
             WHERE {filter}"
        );

        let rows = sqlx::query_as::<_, MemberUserRow>(&list_sql)
            .bind(tenant_id)
            .bind(query.role)
            .bind(query.status)
            .bind(&search)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool);

        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(tenant_id)
            .bind(query.role)
            .bind(query.status)
            .bind(&search)
            .fetch_one(pool);

        let (rows, total) = tokio::try_join!(rows, total)?;
        Ok(Paginated::new(rows, total, page).map(MemberWithUser::from))
    }

    /// Invites by email, creating a placeholder user when the email is unknown.
    pub async fn invite(
        pool: &PgPool,
        tenant_id: Uuid,
        req: &InviteMemberRequest,
    ) -> ApiResult<MemberWithUser> {
        let user = match UserService::find_by_email(pool, &req.email).await? {
            Some(user) => user,
            None => {
                sqlx::query_as::<_, User>(
                    "INSERT INTO users (external_id, email)
                     VALUES ($1, $2)
                     ON CONFLICT (email) DO UPDATE SET updated_at = NOW()
                     RETURNING *",
                )
                .bind(placeholder_external_id(&req.email))
                .bind(&req.email)
                .fetch_one(pool)
                .await?
            }
        };

        let inserted = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO tenant_members (tenant_id, user_id, role, status)
             VALUES ($1, $2, $3, 'pending')
             ON CONFLICT (tenant_id, user_id) DO NOTHING
             RETURNING user_id",
        )
        .bind(tenant_id)
        .bind(user.id)
        .bind(req.role)
        .fetch_optional(pool)
        .await?;

        if inserted.is_none() {
            return Err(ApiError::Conflict(
                "User is already a member of this organization".into(),
            ));
        }

        tracing::info!(tenant_id = %tenant_id, user_id = %user.id, "member invited");
        Self::get(pool, tenant_id, user.id).await
    }

    pub async fn update(
        pool: &PgPool,
        tenant_id: Uuid,
        member_id: Uuid,
        req: &UpdateMemberRequest,
    ) -> ApiResult<TenantMember> {
        sqlx::query_as::<_, TenantMember>(
            "UPDATE tenant_members SET
               role       = COALESCE($3, role),
               status     = COALESCE($4, status),
               updated_at = NOW()
             WHERE id = $1 AND tenant_id = $2
             RETURNING *",
        )
        .bind(member_id)
        .bind(tenant_id)
        .bind(req.role)
        .bind(req.status)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound("Member"))
    }

    pub async fn remove(pool: &PgPool, tenant_id: Uuid, member_id: Uuid) -> ApiResult<()> {
        let deleted = sqlx::query("DELETE FROM tenant_members WHERE id = $1 AND tenant_id = $2")
            .bind(member_id)
            .bind(tenant_id)
            .execute(pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ApiError::NotFound("Member"));
        }
        Ok(())
    }

    /// Active memberships of a user, ordered by tenant name.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> ApiResult<Vec<MembershipWithTenant>> {
        let rows = sqlx::query_as::<_, MemberTenantRow>(
            "SELECT m.*,
                    t.slug AS tenant_slug, t.name AS tenant_name, t.logo AS tenant_logo,
                    t.primary_color AS tenant_primary_color, t.accent_color AS tenant_accent_color
             FROM tenant_members m
             JOIN tenants t ON t.id = m.tenant_id
             WHERE m.user_id = $1 AND m.status = 'active'
             ORDER BY t.name",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(MembershipWithTenant::from).collect())
    }

    /// Joins as an active volunteer. A pending invitation is activated with
    /// its invited role. A deactivated membership comes back as a volunteer.
    pub async fn join(pool: &PgPool, tenant_id: Uuid, user_id: Uuid) -> ApiResult<TenantMember> {
        let member = sqlx::query_as::<_, TenantMember>(
            "INSERT INTO tenant_members (tenant_id, user_id, role, status)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (tenant_id, user_id) DO UPDATE
               SET status = EXCLUDED.status,
                   role = CASE
                       WHEN tenant_members.status = 'inactive' THEN EXCLUDED.role
                       ELSE tenant_members.role
                   END,
                   updated_at = NOW()
               WHERE tenant_members.status <> 'active'
             RETURNING *",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(MemberRole::Volunteer)
        .bind(MemberStatus::Active)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("You are already a member of this organization".into())
        })?;

        tracing::info!(tenant_id = %tenant_id, user_id = %user_id, "member joined");
        Ok(member)
    }

    pub async fn count_active(pool: &PgPool, tenant_id: Uuid) -> ApiResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tenant_members WHERE tenant_id = $1 AND status = 'active'",
        )
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}

/// Escapes LIKE wildcards so user input is matched literally.
pub(crate) fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
