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
        member::{
            InviteMemberRequest, ListMembersQuery, MemberWithUser, MembershipWithTenant,
            TenantMember, UpdateMemberRequest,
        },
        Paginated,
    },
    routes::{require_admin, require_manager},
    services::members::MemberService,
    AppState,
};

pub async fn list_members(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Query(query): Query<ListMembersQuery>,
) -> ApiResult<Json<Paginated<MemberWithUser>>> {
    query.validate()?;
    require_manager(&state, tenant.id, &user).await?;
    Ok(Json(MemberService::list(&state.db, tenant.id, &query).await?))
}

/// GET /members/{user_id}: managers see anyone, others only themselves.
pub async fn get_member(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<MemberWithUser>> {
    if user_id != user.user_id {
        require_manager(&state, tenant.id, &user).await?;
    }
    Ok(Json(MemberService::get(&state.db, tenant.id, user_id).await?))
}

pub async fn invite_member(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Json(body): Json<InviteMemberRequest>,
) -> ApiResult<(StatusCode, Json<MemberWithUser>)> {
    body.validate()?;
    require_admin(&state, tenant.id, &user).await?;
    let member = MemberService::invite(&state.db, tenant.id, &body).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_member(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMemberRequest>,
) -> ApiResult<Json<TenantMember>> {
    require_admin(&state, tenant.id, &user).await?;
    Ok(Json(MemberService::update(&state.db, tenant.id, id, &body).await?))
}

pub async fn remove_member(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_admin(&state, tenant.id, &user).await?;
    MemberService::remove(&state.db, tenant.id, id).await?;
    tracing::info!(member_id = %id, tenant = %tenant.slug, "member removed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn join_tenant(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    user: AuthenticatedUser,
) -> ApiResult<Json<TenantMember>> {
    Ok(Json(MemberService::join(&state.db, tenant.id, user.user_id).await?))
}

pub async fn list_my_memberships(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<MembershipWithTenant>>> {
    Ok(Json(MemberService::list_for_user(&state.db, user.user_id).await?))
}
