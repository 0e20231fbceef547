pub mod health;
pub mod members;
pub mod metrics;
pub mod opportunities;
pub mod pages;
pub mod signups;
pub mod tenants;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{auth::AuthenticatedUser, member::MemberRole},
    services::members::MemberService,
    AppState,
};

/// Builds the full API router.
pub fn create_router(state: AppState) -> Router {
    // Allow the app base domain and its tenant subdomains, plus localhost for development.
    let base = state.config.app_base_url.clone();
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let o = match origin.to_str() {
            Ok(s) => s,
            Err(_) => return false,
        };
        if o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") {
            return true;
        }
        if o == base {
            return true;
        }
        if let Some(idx) = base.find("://") {
            let after_scheme = &base[idx + 3..];
            let domain = after_scheme.split('/').next().unwrap_or(after_scheme);
            let domain_clean = domain.split(':').next().unwrap_or(domain);
            if o.ends_with(&format!(".{domain_clean}")) {
                return true;
            }
        }
        false
    });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-tenant"),
        ]))
        .allow_origin(cors_origin);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        // Tenants
        .route("/tenants", get(tenants::list_tenants).post(tenants::create_tenant))
        .route("/tenants/by-slug/{slug}", get(tenants::get_tenant_by_slug))
        .route(
            "/tenants/{id}",
            get(tenants::get_tenant).put(tenants::update_tenant).delete(tenants::delete_tenant),
        )
        .route("/tenant/info", get(tenants::get_tenant_info))
        // Opportunities
        .route(
            "/opportunities",
            get(opportunities::list_opportunities).post(opportunities::create_opportunity),
        )
        .route(
            "/opportunities/{id}",
            get(opportunities::get_opportunity)
                .put(opportunities::update_opportunity)
                .delete(opportunities::delete_opportunity),
        )
        .route("/opportunities/{id}/publish", post(opportunities::publish_opportunity))
        .route("/opportunities/{id}/cancel", post(opportunities::cancel_opportunity))
        // Signups
        .route("/opportunities/{id}/apply", post(signups::apply))
        .route("/opportunities/{id}/signup", get(signups::get_my_signup))
        .route("/signups", get(signups::list_signups))
        .route("/signups/{id}", put(signups::update_signup))
        .route("/signups/{id}/withdraw", post(signups::withdraw))
        // Members
        .route("/members", get(members::list_members))
        .route("/members/invite", post(members::invite_member))
        .route("/members/join", post(members::join_tenant))
        .route(
            "/members/{id}",
            get(members::get_member).put(members::update_member).delete(members::remove_member),
        )
        // Users
        .route("/users/sync", post(users::sync_user))
        .route("/users/me", get(users::me))
        .route("/users/me/signups", get(signups::list_my_signups))
        .route("/users/me/memberships", get(members::list_my_memberships))
        .route("/users/{id}", get(users::get_user).put(users::update_user))
        // Page loaders
        .route("/pages/home", get(pages::home))
        .route("/pages/dashboard", get(pages::dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// ACTIVE ADMIN or COORDINATOR of the tenant.
pub(crate) async fn require_manager(
    state: &AppState,
    tenant_id: Uuid,
    user: &AuthenticatedUser,
) -> ApiResult<MemberRole> {
    match MemberService::active_role(&state.db, tenant_id, user.user_id).await? {
        Some(role) if role.can_manage() => Ok(role),
        _ => Err(ApiError::Forbidden),
    }
}

/// ACTIVE ADMIN of the tenant.
pub(crate) async fn require_admin(
    state: &AppState,
    tenant_id: Uuid,
    user: &AuthenticatedUser,
) -> ApiResult<()> {
    match MemberService::active_role(&state.db, tenant_id, user.user_id).await? {
        Some(MemberRole::Admin) => Ok(()),
        _ => Err(ApiError::Forbidden),
    }
}
