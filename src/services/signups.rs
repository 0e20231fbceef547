//! Signup lifecycle and the capacity bookkeeping tied to it.
//!
//! `spots_remaining` is only ever changed by single conditional `UPDATE`
//! statements, so concurrent approvals cannot oversubscribe an opportunity:
//! the claim succeeds only while `spots_remaining > 0`, and the release never
//! goes above `capacity`. Each transition also locks the signup row, which
//! keeps a signup from being counted twice when it is approved concurrently.

use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        opportunity::OpportunityStatus,
        signup::{
            ApplyRequest, ListSignupsQuery, MySignup, MySignupRow, MySignupsQuery, Signup,
            SignupDetail, SignupDetailRow, SignupStatus, SpotChange, UpdateSignupRequest,
        },
        tenant::Tenant,
        Page, Paginated,
    },
    services::metrics,
};

pub struct SignupService;

/// A signup row locked for update, with the slug used as the metrics label.
#[derive(FromRow)]
struct LockedSignup {
    #[sqlx(flatten)]
    signup: Signup,
    tenant_slug: String,
}

const LOCK_SIGNUP: &str = "SELECT s.*, t.slug AS tenant_slug
     FROM opportunity_signups s
     JOIN opportunities o ON o.id = s.opportunity_id
     JOIN tenants t ON t.id = o.tenant_id
     WHERE s.id = $1 AND ($2::uuid IS NULL OR o.tenant_id = $2)
     FOR UPDATE OF s";

impl SignupService {
    pub async fn apply(
        pool: &PgPool,
        tenant: &Tenant,
        opportunity_id: Uuid,
        user_id: Uuid,
        req: &ApplyRequest,
    ) -> ApiResult<Signup> {
        let status: Option<OpportunityStatus> = sqlx::query_scalar(
            "SELECT status FROM opportunities WHERE id = $1 AND tenant_id = $2",
        )
        .bind(opportunity_id)
        .bind(tenant.id)
        .fetch_optional(pool)
        .await?;

        match status {
            None => return Err(ApiError::NotFound("Opportunity")),
            Some(OpportunityStatus::Published) => {}
            Some(_) => {
                return Err(ApiError::Conflict(
                    "Opportunity is not accepting applications".into(),
                ))
            }
        }

        let signup = sqlx::query_as::<_, Signup>(
            "INSERT INTO opportunity_signups (opportunity_id, user_id, status, notes)
             VALUES ($1, $2, 'applied', $3)
             ON CONFLICT (opportunity_id, user_id) DO NOTHING
             RETURNING *",
        )
        .bind(opportunity_id)
        .bind(user_id)
        .bind(&req.notes)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("You have already applied to this opportunity".into())
        })?;

        metrics::record_signup_created(&tenant.slug);
        tracing::info!(signup_id = %signup.id, opportunity_id = %opportunity_id, "application submitted");
        Ok(signup)
    }

    /// Coordinator-driven status change within a tenant.
    pub async fn update_status(
        pool: &PgPool,
        tenant_id: Uuid,
        signup_id: Uuid,
        req: &UpdateSignupRequest,
    ) -> ApiResult<Signup> {
        let mut tx = pool.begin().await?;

        let LockedSignup { signup: current, tenant_slug } =
            sqlx::query_as::<_, LockedSignup>(LOCK_SIGNUP)
                .bind(signup_id)
                .bind(Some(tenant_id))
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(ApiError::NotFound("Signup"))?;

        if !current.status.can_transition_to(req.status) {
            return Err(ApiError::Validation(format!(
                "Cannot move a {} signup to {}",
                current.status.as_str(),
                req.status.as_str()
            )));
        }

        let updated = transition(&mut tx, &current, req.status, req.notes.as_deref()).await?;
        tx.commit().await?;

        metrics::record_transition(&tenant_slug, updated.status.as_str());
        tracing::info!(
            signup_id = %signup_id,
            from = current.status.as_str(),
            to = updated.status.as_str(),
            "signup status changed"
        );
        Ok(updated)
    }

    /// The volunteer cancels their own signup; a held spot is given back.
    /// Withdrawing an already cancelled signup changes nothing.
    pub async fn withdraw(pool: &PgPool, signup_id: Uuid, user_id: Uuid) -> ApiResult<Signup> {
        let mut tx = pool.begin().await?;

        let LockedSignup { signup: current, tenant_slug } =
            sqlx::query_as::<_, LockedSignup>(LOCK_SIGNUP)
                .bind(signup_id)
                .bind(None::<Uuid>)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(ApiError::NotFound("Signup"))?;

        if current.user_id != user_id {
            return Err(ApiError::Forbidden);
        }
        if current.status == SignupStatus::Cancelled {
            return Ok(current);
        }

        let updated = transition(&mut tx, &current, SignupStatus::Cancelled, None).await?;
        tx.commit().await?;

        metrics::record_transition(&tenant_slug, updated.status.as_str());
        tracing::info!(signup_id = %signup_id, "application withdrawn");
        Ok(updated)
    }

    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        query: &ListSignupsQuery,
    ) -> ApiResult<Paginated<SignupDetail>> {
        let page = Page::new(query.limit, query.offset);
        let filter = "o.tenant_id = $1
             AND ($2::uuid IS NULL OR s.opportunity_id = $2)
             AND ($3::uuid IS NULL OR s.user_id = $3)
             AND ($4::signup_status IS NULL OR s.status = $4)";

        let list_sql = format!(
            "SELECT s.*,
                    u.email AS user_email, u.name AS user_name, u.avatar_url AS user_avatar_url,
                    o.title AS opportunity_title, o.start_date AS opportunity_start_date
             FROM opportunity_signups s
             JOIN opportunities o ON o.id = s.opportunity_id
             JOIN users u ON u.id = s.user_id
             WHERE {filter}
             ORDER BY s.applied_at DESC, s.id
             LIMIT $5 OFFSET $6"
        );
        let count_sql = format!(
            "SELECT COUNT(*) FROM opportunity_signups s
             JOIN opportunities o ON o.id = s.opportunity_id
             WHERE {filter}"
        );

        let rows = sqlx::query_as::<_, SignupDetailRow>(&list_sql)
            .bind(tenant_id)
            .bind(query.opportunity_id)
            .bind(query.user_id)
            .bind(query.status)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool);

        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(tenant_id)
            .bind(query.opportunity_id)
            .bind(query.user_id)
            .bind(query.status)
            .fetch_one(pool);

        let (rows, total) = tokio::try_join!(rows, total)?;
        Ok(Paginated::new(rows, total, page).map(SignupDetail::from))
    }

    /// The user's signup for one opportunity of the tenant, if any.
    pub async fn get_for_user(
        pool: &PgPool,
        tenant_id: Uuid,
        opportunity_id: Uuid,
        user_id: Uuid,
    ) -> ApiResult<Option<Signup>> {
        let signup = sqlx::query_as::<_, Signup>(
            "SELECT s.* FROM opportunity_signups s
             JOIN opportunities o ON o.id = s.opportunity_id
             WHERE s.opportunity_id = $1 AND s.user_id = $2 AND o.tenant_id = $3",
        )
        .bind(opportunity_id)
        .bind(user_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;
        Ok(signup)
    }

    /// A user's signups across all tenants. Cancelled ones are hidden unless
    /// explicitly filtered for.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        query: &MySignupsQuery,
    ) -> ApiResult<Paginated<MySignup>> {
        let page = Page::new(query.limit, query.offset);
        let filter = "s.user_id = $1
             AND (($2::signup_status IS NULL AND s.status <> 'cancelled') OR s.status = $2)";

        let list_sql = format!(
            "SELECT s.*,
                    o.title AS opportunity_title, o.start_date AS opportunity_start_date,
                    t.id AS tenant_id, t.slug AS tenant_slug, t.name AS tenant_name,
                    t.logo AS tenant_logo, t.primary_color AS tenant_primary_color,
                    t.accent_color AS tenant_accent_color
             FROM opportunity_signups s
             JOIN opportunities o ON o.id = s.opportunity_id
             JOIN tenants t ON t.id = o.tenant_id
             WHERE {filter}
             ORDER BY s.applied_at DESC, s.id
             LIMIT $3 OFFSET $4"
        );
        let count_sql = format!("SELECT COUNT(*) FROM opportunity_signups s WHERE {filter}");

        let rows = sqlx::query_as::<_, MySignupRow>(&list_sql)
            .bind(user_id)
            .bind(query.status)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool);

        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(user_id)
            .bind(query.status)
            .fetch_one(pool);

        let (rows, total) = tokio::try_join!(rows, total)?;
        Ok(Paginated::new(rows, total, page).map(MySignup::from))
    }

    /// Applications waiting for a decision across the tenant.
    pub async fn count_pending(pool: &PgPool, tenant_id: Uuid) -> ApiResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM opportunity_signups s
             JOIN opportunities o ON o.id = s.opportunity_id
             WHERE o.tenant_id = $1 AND s.status = 'applied'",
        )
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}

/// Applies a status change to a signup locked by the caller's transaction,
/// adjusting the opportunity's spot counter first.
async fn transition(
    tx: &mut Transaction<'_, Postgres>,
    current: &Signup,
    to: SignupStatus,
    notes: Option<&str>,
) -> ApiResult<Signup> {
    match current.status.spot_change(to) {
        SpotChange::Claim => {
            // Unlimited (capacity 0) opportunities match without touching the counter.
            let claimed = sqlx::query(
                "UPDATE opportunities SET
                   spots_remaining = CASE WHEN capacity > 0 THEN spots_remaining - 1 ELSE spots_remaining END,
                   updated_at = NOW()
                 WHERE id = $1 AND (capacity = 0 OR spots_remaining > 0)",
            )
            .bind(current.opportunity_id)
            .execute(&mut **tx)
            .await?;

            if claimed.rows_affected() == 0 {
                metrics::record_capacity_rejection();
                tracing::warn!(
                    opportunity_id = %current.opportunity_id,
                    signup_id = %current.id,
                    "approval refused, no spots remaining"
                );
                return Err(ApiError::Conflict("No spots remaining".into()));
            }
        }
        SpotChange::Release => {
            sqlx::query(
                "UPDATE opportunities SET
                   spots_remaining = CASE
                       WHEN capacity > 0 THEN LEAST(capacity, spots_remaining + 1)
                       ELSE spots_remaining
                   END,
                   updated_at = NOW()
                 WHERE id = $1",
            )
            .bind(current.opportunity_id)
            .execute(&mut **tx)
            .await?;
        }
        SpotChange::Unchanged => {}
    }

    let entering_approved = current.status.stamps_approval(to);
    let entering_completed = current.status.stamps_completion(to);

    let updated = sqlx::query_as::<_, Signup>(
        "UPDATE opportunity_signups SET
           status       = $2,
           notes        = COALESCE($3, notes),
           approved_at  = CASE WHEN $4 THEN NOW() ELSE approved_at END,
           completed_at = CASE WHEN $5 THEN NOW() ELSE completed_at END
         WHERE id = $1
         RETURNING *",
    )
    .bind(current.id)
    .bind(to)
    .bind(notes)
    .bind(entering_approved)
    .bind(entering_completed)
    .fetch_one(&mut **tx)
    .await?;

    Ok(updated)
}
