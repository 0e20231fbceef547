use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        auth::{AuthenticatedUser, ExternalIdentity},
        user::{SyncUserRequest, UpdateUserRequest, User},
    },
    services::users::UserService,
    AppState,
};

/// Called by the client after every identity-provider login.
pub async fn sync_user(
    State(state): State<AppState>,
    identity: ExternalIdentity,
    body: Option<Json<SyncUserRequest>>,
) -> ApiResult<Json<User>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    body.validate()?;
    let user = UserService::sync(&state.db, &identity, &body).await?;
    tracing::debug!(user_id = %user.id, "user synced");
    Ok(Json(user))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<User>> {
    Ok(Json(UserService::get(&state.db, user.user_id).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(UserService::get(&state.db, id).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    if id != user.user_id {
        return Err(ApiError::Forbidden);
    }
    body.validate()?;
    Ok(Json(UserService::update(&state.db, id, &body).await?))
}
