use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::{models::tenant::Tenant, AppState};

/// Validates that a slug only contains lowercase ASCII letters, digits and hyphens,
/// does not start or end with a hyphen, and is between 3 and 50 characters.
pub(crate) fn is_valid_slug(s: &str) -> bool {
    let len = s.len();
    (3..=50).contains(&len)
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}

/// Resolves the tenant from the `X-Tenant` header or first subdomain and loads it.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Tenant);

impl FromRequestParts<AppState> for CurrentTenant {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let slug = extract_slug(parts)?;

        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE slug = $1")
            .bind(&slug)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "tenant lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "Database error" })))
            })?;

        match tenant {
            Some(tenant) => Ok(CurrentTenant(tenant)),
            None => Err((StatusCode::NOT_FOUND, Json(json!({ "error": "Tenant not found" })))),
        }
    }
}

pub(crate) fn extract_slug(parts: &Parts) -> Result<String, (StatusCode, Json<Value>)> {
    // 1. X-Tenant header
    if let Some(tenant) = parts
        .headers
        .get("X-Tenant")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase())
        .filter(|s| !s.is_empty())
    {
        if !is_valid_slug(&tenant) {
            return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid tenant identifier" }))));
        }
        return Ok(tenant);
    }

    // 2. Subdomain from Host header
    if let Some(host) = parts.headers.get("Host").and_then(|v| v.to_str().ok()) {
        let domain = host.split(':').next().unwrap_or(host);
        let labels: Vec<&str> = domain.split('.').collect();
        if let [subdomain, _, _, ..] = labels.as_slice() {
            let subdomain = subdomain.to_lowercase();
            if subdomain != "www" && subdomain != "api" {
                if !is_valid_slug(&subdomain) {
                    return Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid tenant identifier" }))));
                }
                return Ok(subdomain);
            }
        }
    }

    Err((StatusCode::BAD_REQUEST, Json(json!({ "error": "Missing X-Tenant header" }))))
}
