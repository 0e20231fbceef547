use axum::{
    extract::{Path, State},
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
        tenant::{CreateTenantRequest, Tenant, TenantInfo, UpdateTenantRequest},
    },
    routes::require_admin,
    services::tenants::TenantService,
    AppState,
};

pub async fn list_tenants(State(state): State<AppState>) -> ApiResult<Json<Vec<Tenant>>> {
    Ok(Json(TenantService::list(&state.db).await?))
}

pub async fn get_tenant_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Tenant>> {
    Ok(Json(TenantService::get_by_slug(&state.db, &slug.to_lowercase()).await?))
}

pub async fn get_tenant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Tenant>> {
    Ok(Json(TenantService::get(&state.db, id).await?))
}

pub async fn create_tenant(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateTenantRequest>,
) -> ApiResult<(StatusCode, Json<Tenant>)> {
    body.validate()?;
    let tenant = TenantService::create(&state.db, &body, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

pub async fn update_tenant(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTenantRequest>,
) -> ApiResult<Json<Tenant>> {
    body.validate()?;
    require_admin(&state, id, &user).await?;
    Ok(Json(TenantService::update(&state.db, id, &body).await?))
}

pub async fn delete_tenant(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&state, id, &user).await?;
    TenantService::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Branding and resolved terminology for the tenant of the request.
pub async fn get_tenant_info(CurrentTenant(tenant): CurrentTenant) -> Json<TenantInfo> {
    Json(TenantInfo::from(&tenant))
}
