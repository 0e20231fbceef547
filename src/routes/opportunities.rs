use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::ApiResult,
    middleware::tenant::CurrentTenant,
    models::{
        auth::AuthenticatedUser,
        opportunity::{
            CreateOpportunityRequest, ListOpportunitiesQuery, Opportunity, OpportunityStatus,
            OpportunityWithCount, UpdateOpportunityRequest,
        },
        Paginated,
    },
    routes::require_manager,
    services::opportunities::OpportunityService,
    AppState,
};

pub async fn list_opportunities(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Query(query): Query<ListOpportunitiesQuery>,
) -> ApiResult<Json<Paginated<OpportunityWithCount>>> {
    query.validate()?;
    Ok(Json(OpportunityService::list(&state.db, tenant.id, &query).await?))
}

pub async fn get_opportunity(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OpportunityWithCount>> {
    Ok(Json(OpportunityService::get(&state.db, tenant.id, id).await?))
}

pub async fn create_opportunity(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Json(body): Json<CreateOpportunityRequest>,
) -> ApiResult<(StatusCode, Json<Opportunity>)> {
    body.validate()?;
    require_manager(&state, tenant.id, &user).await?;
    let opportunity = OpportunityService::create(&state.db, tenant.id, &body).await?;
    Ok((StatusCode::CREATED, Json(opportunity)))
}

pub async fn update_opportunity(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOpportunityRequest>,
) -> ApiResult<Json<Opportunity>> {
    body.validate()?;
    require_manager(&state, tenant.id, &user).await?;
    Ok(Json(OpportunityService::update(&state.db, tenant.id, id, &body).await?))
}

pub async fn publish_opportunity(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Opportunity>> {
    require_manager(&state, tenant.id, &user).await?;
    let opportunity =
        OpportunityService::set_status(&state.db, tenant.id, id, OpportunityStatus::Published)
            .await?;
    Ok(Json(opportunity))
}

pub async fn cancel_opportunity(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Opportunity>> {
    require_manager(&state, tenant.id, &user).await?;
    let opportunity =
        OpportunityService::set_status(&state.db, tenant.id, id, OpportunityStatus::Cancelled)
            .await?;
    Ok(Json(opportunity))
}

pub async fn delete_opportunity(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_manager(&state, tenant.id, &user).await?;
    OpportunityService::delete(&state.db, tenant.id, id).await?;
    tracing::info!(opportunity_id = %id, tenant = %tenant.slug, "opportunity deleted");
    Ok(StatusCode::NO_CONTENT)
}
