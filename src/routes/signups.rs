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
        signup::{
            ApplyRequest, ListSignupsQuery, MySignup, MySignupsQuery, Signup, SignupDetail,
            UpdateSignupRequest,
        },
        Paginated,
    },
    routes::require_manager,
    services::signups::SignupService,
    AppState,
};

/// POST /opportunities/{id}/apply. The body is optional.
pub async fn apply(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Path(opportunity_id): Path<Uuid>,
    body: Option<Json<ApplyRequest>>,
) -> ApiResult<(StatusCode, Json<Signup>)> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()?;
    let signup =
        SignupService::apply(&state.db, &tenant, opportunity_id, user.user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(signup)))
}

/// The caller's signup for an opportunity, or `null`.
pub async fn get_my_signup(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Path(opportunity_id): Path<Uuid>,
) -> ApiResult<Json<Option<Signup>>> {
    let signup =
        SignupService::get_for_user(&state.db, tenant.id, opportunity_id, user.user_id).await?;
    Ok(Json(signup))
}

pub async fn list_signups(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Query(query): Query<ListSignupsQuery>,
) -> ApiResult<Json<Paginated<SignupDetail>>> {
    query.validate()?;
    require_manager(&state, tenant.id, &user).await?;
    Ok(Json(SignupService::list(&state.db, tenant.id, &query).await?))
}

pub async fn update_signup(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateSignupRequest>,
) -> ApiResult<Json<Signup>> {
    body.validate()?;
    require_manager(&state, tenant.id, &user).await?;
    Ok(Json(SignupService::update_status(&state.db, tenant.id, id, &body).await?))
}

pub async fn withdraw(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Signup>> {
    Ok(Json(SignupService::withdraw(&state.db, id, user.user_id).await?))
}

pub async fn list_my_signups(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<MySignupsQuery>,
) -> ApiResult<Json<Paginated<MySignup>>> {
    query.validate()?;
    Ok(Json(SignupService::list_for_user(&state.db, user.user_id, &query).await?))
}
