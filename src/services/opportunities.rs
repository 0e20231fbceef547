use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        opportunity::{
            CreateOpportunityRequest, ListOpportunitiesQuery, Opportunity, OpportunityStatus,
            OpportunityWithCount, UpdateOpportunityRequest,
        },
        Page, Paginated,
    },
    services::members::escape_like,
};

/// `o.*` plus the number of APPLIED/APPROVED signups.
const WITH_COUNT_COLUMNS: &str = "o.*,
    (SELECT COUNT(*) FROM opportunity_signups s
      WHERE s.opportunity_id = o.id AND s.status IN ('applied', 'approved')) AS active_signups";

pub struct OpportunityService;

impl OpportunityService {
    pub async fn get(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> ApiResult<OpportunityWithCount> {
        sqlx::query_as::<_, OpportunityWithCount>(&format!(
            "SELECT {WITH_COUNT_COLUMNS} FROM opportunities o WHERE o.id = $1 AND o.tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound("Opportunity"))
    }

    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        query: &ListOpportunitiesQuery,
    ) -> ApiResult<Paginated<OpportunityWithCount>> {
        let page = Page::new(query.limit, query.offset);
        let status = query.status.unwrap_or(OpportunityStatus::Published);
        let tags = query.tag_list();
        let search = query.search.as_deref().map(|s| format!("%{}%", escape_like(s)));

        let filter = "o.tenant_id = $1
             AND o.status = $2
             AND ($3::opportunity_type IS NULL OR o.type = $3)
             AND ($4::timestamptz IS NULL OR o.start_date >= $4)
             AND ($5::timestamptz IS NULL OR o.start_date <= $5)
             AND (cardinality($6::text[]) = 0 OR o.tags && $6)
             AND ($7::text IS NULL OR o.title ILIKE $7 OR o.description ILIKE $7)";

        let list_sql = format!(
            "SELECT {WITH_COUNT_COLUMNS}
             FROM opportunities o
             WHERE {filter}
             ORDER BY {} {}, o.id
             LIMIT $8 OFFSET $9",
            query.sort.column(),
            query.order.keyword(),
        );
        let count_sql = format!("SELECT COUNT(*) FROM opportunities o WHERE {filter}");

        let rows = sqlx::query_as::<_, OpportunityWithCount>(&list_sql)
            .bind(tenant_id)
            .bind(status)
            .bind(query.kind)
            .bind(query.from_date)
            .bind(query.to_date)
            .bind(&tags)
            .bind(&search)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool);

        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(tenant_id)
            .bind(status)
            .bind(query.kind)
            .bind(query.from_date)
            .bind(query.to_date)
            .bind(&tags)
            .bind(&search)
            .fetch_one(pool);

        let (rows, total) = tokio::try_join!(rows, total)?;
        Ok(Paginated::new(rows, total, page))
    }

    /// Most recently created opportunities of any status, for the dashboard.
    pub async fn recent(
        pool: &PgPool,
        tenant_id: Uuid,
        limit: i64,
    ) -> ApiResult<Vec<OpportunityWithCount>> {
        let rows = sqlx::query_as::<_, OpportunityWithCount>(&format!(
            "SELECT {WITH_COUNT_COLUMNS}
             FROM opportunities o
             WHERE o.tenant_id = $1
             ORDER BY o.created_at DESC
             LIMIT $2"
        ))
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// New opportunities start as drafts with every spot free.
    pub async fn create(
        pool: &PgPool,
        tenant_id: Uuid,
        req: &CreateOpportunityRequest,
    ) -> ApiResult<Opportunity> {
        let opportunity = sqlx::query_as::<_, Opportunity>(
            "INSERT INTO opportunities
               (tenant_id, title, description, type, status, location, address, is_virtual,
                start_date, end_date, recurrence, requirements, capacity, spots_remaining, tags)
             VALUES ($1, $2, $3, $4, 'draft', $5, $6, $7, $8, $9, $10, $11, $12, $12, $13)
             RETURNING *",
        )
        .bind(tenant_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.kind)
        .bind(&req.location)
        .bind(&req.address)
        .bind(req.is_virtual)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(&req.recurrence)
        .bind(Json(req.requirements.clone().unwrap_or_default()))
        .bind(req.capacity)
        .bind(req.tags.clone().unwrap_or_default())
        .fetch_one(pool)
        .await?;

        tracing::info!(opportunity_id = %opportunity.id, tenant_id = %tenant_id, "opportunity created");
        Ok(opportunity)
    }

    /// Partial update, run against the locked opportunity row. A new capacity
    /// recomputes `spots_remaining` from the signups holding a spot and may
    /// not drop below them.
    pub async fn update(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
        req: &UpdateOpportunityRequest,
    ) -> ApiResult<Opportunity> {
        let mut tx = pool.begin().await?;

        // Claims and releases update this row, so holding its lock freezes the
        // held count until commit.
        let current = sqlx::query_as::<_, Opportunity>(
            "SELECT * FROM opportunities WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("Opportunity"))?;

        req.validate_window_against(&current)
            .map_err(|e| ApiError::Validation(format!("Invalid input: {}", e.code)))?;

        let spots_remaining = match req.capacity {
            None => None,
            Some(0) => Some(0),
            Some(capacity) => {
                let held = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM opportunity_signups
                     WHERE opportunity_id = $1 AND status IN ('approved', 'completed')",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
                Some(spots_after_resize(capacity, held)?)
            }
        };

        let opportunity = sqlx::query_as::<_, Opportunity>(
            "UPDATE opportunities SET
               title        = COALESCE($3, title),
               description  = COALESCE($4, description),
               type         = COALESCE($5, type),
               status       = COALESCE($6, status),
               location     = CASE WHEN $7 THEN NULL ELSE COALESCE($8, location) END,
               address      = CASE WHEN $9 THEN NULL ELSE COALESCE($10, address) END,
               is_virtual   = COALESCE($11, is_virtual),
               start_date   = COALESCE($12, start_date),
               end_date     = CASE WHEN $13 THEN NULL ELSE COALESCE($14, end_date) END,
               recurrence   = CASE WHEN $15 THEN NULL ELSE COALESCE($16, recurrence) END,
               requirements = COALESCE($17, requirements),
               tags         = COALESCE($18, tags),
               capacity     = COALESCE($19, capacity),
               spots_remaining = COALESCE($20, spots_remaining),
               updated_at   = NOW()
             WHERE id = $1 AND tenant_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.kind)
        .bind(req.status)
        .bind(req.clear_location)
        .bind(&req.location)
        .bind(req.clear_address)
        .bind(&req.address)
        .bind(req.is_virtual)
        .bind(req.start_date)
        .bind(req.clear_end_date)
        .bind(req.end_date)
        .bind(req.clear_recurrence)
        .bind(&req.recurrence)
        .bind(req.requirements.as_ref().map(Json))
        .bind(&req.tags)
        .bind(req.capacity)
        .bind(spots_remaining)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if let Some(capacity) = req.capacity {
            tracing::info!(
                opportunity_id = %id,
                capacity,
                spots_remaining = opportunity.spots_remaining,
                "opportunity capacity changed"
            );
        }
        Ok(opportunity)
    }

    pub async fn set_status(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
        status: OpportunityStatus,
    ) -> ApiResult<Opportunity> {
        let opportunity = sqlx::query_as::<_, Opportunity>(
            "UPDATE opportunities SET status = $3, updated_at = NOW()
             WHERE id = $1 AND tenant_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(status)
        .fetch_optional(pool)
        .await?
        .ok_or(ApiError::NotFound("Opportunity"))?;

        tracing::info!(opportunity_id = %id, status = ?status, "opportunity status changed");
        Ok(opportunity)
    }

    /// Signups are removed with it (FK cascade).
    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> ApiResult<()> {
        let deleted = sqlx::query("DELETE FROM opportunities WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ApiError::NotFound("Opportunity"));
        }
        Ok(())
    }
}

/// Free spots for a limited capacity given the signups already holding one.
fn spots_after_resize(capacity: i32, held: i64) -> ApiResult<i32> {
    let held = i32::try_from(held).unwrap_or(i32::MAX);
    if held > capacity {
        return Err(ApiError::Conflict(format!(
            "Capacity cannot be lower than the {held} approved volunteers"
        )));
    }
    Ok(capacity - held)
}
