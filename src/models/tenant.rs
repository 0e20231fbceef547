use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::middleware::tenant::is_valid_slug;

pub const DEFAULT_PRIMARY_COLOR: &str = "#3b82f6";
pub const DEFAULT_ACCENT_COLOR: &str = "#10b981";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub logo: Option<String>,
    pub primary_color: String,
    pub accent_color: String,
    /// Custom wording that replaces the default UI terms for this tenant.
    pub terminology: Json<BTreeMap<String, String>>,
    pub features: Json<BTreeMap<String, bool>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTenantRequest {
    #[validate(length(min = 3, max = 50), custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(url)]
    pub logo: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub primary_color: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub accent_color: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTenantRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(url)]
    pub logo: Option<String>,
    /// Clears the logo when true, regardless of `logo`.
    #[serde(default)]
    pub remove_logo: bool,
    #[validate(custom(function = "validate_hex_color"))]
    pub primary_color: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub accent_color: Option<String>,
    pub terminology: Option<BTreeMap<String, String>>,
    pub features: Option<BTreeMap<String, bool>>,
}

/// Public branding payload for the tenant resolved from the request.
#[derive(Debug, Serialize)]
pub struct TenantInfo {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub logo: Option<String>,
    pub primary_color: String,
    pub accent_color: String,
    pub terminology: BTreeMap<String, String>,
    pub features: BTreeMap<String, bool>,
}

impl From<&Tenant> for TenantInfo {
    fn from(t: &Tenant) -> Self {
        Self {
            id: t.id,
            slug: t.slug.clone(),
            name: t.name.clone(),
            logo: t.logo.clone(),
            primary_color: t.primary_color.clone(),
            accent_color: t.accent_color.clone(),
            terminology: crate::services::terminology::resolve(&t.terminology.0),
            features: t.features.0.clone(),
        }
    }
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if is_valid_slug(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("slug"))
    }
}

/// Accepts `#rrggbb` only.
pub(crate) fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let ok = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(slug: &str) -> CreateTenantRequest {
        CreateTenantRequest {
            slug: slug.into(),
            name: "Springfield Food Bank".into(),
            logo: None,
            primary_color: None,
            accent_color: None,
        }
    }

    #[test]
    fn slug_rules() {
        assert!(create("demo-org").validate().is_ok());
        assert!(create("ab").validate().is_err());
        assert!(create("Demo").validate().is_err());
        assert!(create("-demo").validate().is_err());
        assert!(create("demo_org").validate().is_err());
    }

    #[test]
    fn colors_must_be_six_digit_hex() {
        assert!(validate_hex_color("#3B82f6").is_ok());
        assert!(validate_hex_color("3b82f6").is_err());
        assert!(validate_hex_color("#fff").is_err());
        assert!(validate_hex_color("#gggggg").is_err());
    }

    #[test]
    fn logo_must_be_a_url() {
        let mut req = create("demo-org");
        req.logo = Some("not a url".into());
        assert!(req.validate().is_err());
        req.logo = Some("https://cdn.example.org/logo.png".into());
        assert!(req.validate().is_ok());
    }
}
