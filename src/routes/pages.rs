//! Aggregated loaders for tenant pages: one call returns everything the page renders.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    error::ApiResult,
    middleware::tenant::CurrentTenant,
    models::{
        auth::AuthenticatedUser,
        opportunity::{ListOpportunitiesQuery, OpportunityWithCount},
        tenant::TenantInfo,
    },
    routes::require_manager,
    services::{
        members::MemberService, opportunities::OpportunityService, signups::SignupService,
        terminology,
    },
    AppState,
};

const HOME_PAGE_SIZE: i64 = 12;
const DASHBOARD_OPPORTUNITIES: i64 = 100;

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub tenant: TenantInfo,
    /// e.g. "Upcoming Opportunities", in the tenant's own wording.
    pub heading: String,
    pub opportunities: Vec<OpportunityWithCount>,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub tenant: TenantInfo,
    pub opportunities: Vec<OpportunityWithCount>,
    pub active_members: i64,
    pub pending_signups: i64,
}

/// GET /pages/home: the next published opportunities by start date.
pub async fn home(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
) -> ApiResult<Json<HomePage>> {
    let query = ListOpportunitiesQuery {
        limit: Some(HOME_PAGE_SIZE),
        ..Default::default()
    };
    let page = OpportunityService::list(&state.db, tenant.id, &query).await?;

    let heading = format!("Upcoming {}", terminology::term(&tenant.terminology.0, "opportunities"));

    Ok(Json(HomePage {
        tenant: TenantInfo::from(&tenant),
        heading,
        opportunities: page.items,
        has_more: page.has_more,
    }))
}

/// GET /pages/dashboard: management overview, managers only.
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
) -> ApiResult<Json<DashboardPage>> {
    require_manager(&state, tenant.id, &user).await?;

    let (opportunities, active_members, pending_signups) = tokio::try_join!(
        OpportunityService::recent(&state.db, tenant.id, DASHBOARD_OPPORTUNITIES),
        MemberService::count_active(&state.db, tenant.id),
        SignupService::count_pending(&state.db, tenant.id),
    )?;

    Ok(Json(DashboardPage {
        tenant: TenantInfo::from(&tenant),
        opportunities,
        active_members,
        pending_signups,
    }))
}
