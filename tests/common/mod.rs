use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use volunteerhub_api::config::Config;
use volunteerhub_api::models::auth::{Claims, ExternalIdentity};
use volunteerhub_api::models::opportunity::{
    CreateOpportunityRequest, Opportunity, OpportunityStatus, OpportunityType,
};
use volunteerhub_api::models::tenant::{CreateTenantRequest, Tenant};
use volunteerhub_api::models::user::{SyncUserRequest, User};
use volunteerhub_api::routes::create_router;
use volunteerhub_api::services::{
    opportunities::OpportunityService, tenants::TenantService, users::UserService,
};
use volunteerhub_api::AppState;

#[allow(dead_code)]
pub const TEST_SECRET: &str = "test-secret-please-ignore";

/// Check if a test database is configured.
#[allow(dead_code)]
pub fn database_available() -> bool {
    std::env::var("TEST_DATABASE_URL").is_ok()
}

/// Skip test with message if no database is configured.
#[macro_export]
macro_rules! require_db {
    () => {
        if !crate::common::database_available() {
            eprintln!("Skipping: TEST_DATABASE_URL not set");
            return;
        }
    };
}

#[allow(dead_code)]
pub fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        database_max_connections: 5,
        auth_jwt_secret: TEST_SECRET.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        app_base_url: "https://volunteerhub.app".to_string(),
    }
}

/// Router over a pool that never connects; only routes that fail before
/// touching the database can be exercised with it.
#[allow(dead_code)]
pub fn create_test_app() -> axum::Router {
    let url = "postgres://postgres@127.0.0.1:1/unused";
    let db = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy(url)
        .unwrap();
    let state = AppState {
        db,
        config: Arc::new(test_config(url)),
    };
    create_router(state)
}

/// Signs a session token the way the identity provider would.
#[allow(dead_code)]
pub fn create_test_jwt(sub: &str, email: &str) -> String {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: sub.to_string(),
        email: email.to_string(),
        name: None,
        exp: now + 3600,
        iat: Some(now),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Connects to `TEST_DATABASE_URL` and applies migrations.
#[allow(dead_code)]
pub async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").unwrap();
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");
    volunteerhub_api::db::run_migrations(&pool).await.unwrap();
    pool
}

/// Short random suffix so tests can share one database.
#[allow(dead_code)]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..10])
}

#[allow(dead_code)]
pub async fn create_user(pool: &PgPool) -> User {
    let external_id = unique("user");
    let identity = ExternalIdentity {
        email: format!("{external_id}@example.org"),
        external_id,
        name: None,
    };
    UserService::sync(pool, &identity, &SyncUserRequest::default())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn create_tenant(pool: &PgPool, admin: &User) -> Tenant {
    let req = CreateTenantRequest {
        slug: unique("org"),
        name: "Test Organization".into(),
        logo: None,
        primary_color: None,
        accent_color: None,
    };
    TenantService::create(pool, &req, admin.id).await.unwrap()
}

#[allow(dead_code)]
pub async fn create_published_opportunity(
    pool: &PgPool,
    tenant_id: Uuid,
    capacity: i32,
) -> Opportunity {
    let req = CreateOpportunityRequest {
        title: "Food Bank Weekly Shift".into(),
        description: "Sort and package donations.".into(),
        kind: OpportunityType::Shift,
        location: None,
        address: None,
        is_virtual: false,
        start_date: Utc::now() + Duration::days(7),
        end_date: None,
        recurrence: Some("weekly".into()),
        requirements: None,
        capacity,
        tags: Some(vec!["food bank".into()]),
    };
    let created = OpportunityService::create(pool, tenant_id, &req).await.unwrap();
    OpportunityService::set_status(pool, tenant_id, created.id, OpportunityStatus::Published)
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn spots_remaining(pool: &PgPool, opportunity_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT spots_remaining FROM opportunities WHERE id = $1")
        .bind(opportunity_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Signups currently holding a spot (APPROVED or COMPLETED).
#[allow(dead_code)]
pub async fn held_spots(pool: &PgPool, opportunity_id: Uuid) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM opportunity_signups
         WHERE opportunity_id = $1 AND status IN ('approved', 'completed')",
    )
    .bind(opportunity_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
