use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Admin,
    Coordinator,
    Volunteer,
}

impl MemberRole {
    /// Admins and coordinators manage opportunities and applications.
    pub fn can_manage(self) -> bool {
        matches!(self, MemberRole::Admin | MemberRole::Coordinator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Pending,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantMember {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of `tenant_members` joined with `users`.
#[derive(Debug, FromRow)]
pub struct MemberUserRow {
    #[sqlx(flatten)]
    pub member: TenantMember,
    pub user_email: String,
    pub user_name: Option<String>,
    pub user_avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MemberWithUser {
    #[serde(flatten)]
    pub member: TenantMember,
    pub user: UserSummary,
}

impl From<MemberUserRow> for MemberWithUser {
    fn from(row: MemberUserRow) -> Self {
        Self {
            user: UserSummary {
                id: row.member.user_id,
                email: row.user_email,
                name: row.user_name,
                avatar_url: row.user_avatar_url,
            },
            member: row.member,
        }
    }
}

/// Row shape of `tenant_members` joined with `tenants`.
#[derive(Debug, FromRow)]
pub struct MemberTenantRow {
    #[sqlx(flatten)]
    pub member: TenantMember,
    pub tenant_slug: String,
    pub tenant_name: String,
    pub tenant_logo: Option<String>,
    pub tenant_primary_color: String,
    pub tenant_accent_color: String,
}

#[derive(Debug, Serialize)]
pub struct TenantSummary {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub logo: Option<String>,
    pub primary_color: String,
    pub accent_color: String,
}

#[derive(Debug, Serialize)]
pub struct MembershipWithTenant {
    #[serde(flatten)]
    pub member: TenantMember,
    pub tenant: TenantSummary,
}

impl From<MemberTenantRow> for MembershipWithTenant {
    fn from(row: MemberTenantRow) -> Self {
        Self {
            tenant: TenantSummary {
                id: row.member.tenant_id,
                slug: row.tenant_slug,
                name: row.tenant_name,
                logo: row.tenant_logo,
                primary_color: row.tenant_primary_color,
                accent_color: row.tenant_accent_color,
            },
            member: row.member,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberRequest {
    #[validate(email)]
    pub email: String,
    #[serde(default = "default_invite_role")]
    pub role: MemberRole,
}

fn default_invite_role() -> MemberRole {
    MemberRole::Volunteer
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: Option<MemberRole>,
    pub status: Option<MemberStatus>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListMembersQuery {
    pub role: Option<MemberRole>,
    pub status: Option<MemberStatus>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_in_upper_case() {
        assert_eq!(serde_json::to_string(&MemberRole::Coordinator).unwrap(), "\"COORDINATOR\"");
        let status: MemberStatus = serde_json::from_str("\"INACTIVE\"").unwrap();
        assert_eq!(status, MemberStatus::Inactive);
    }

    #[test]
    fn only_admins_and_coordinators_manage() {
        assert!(MemberRole::Admin.can_manage());
        assert!(MemberRole::Coordinator.can_manage());
        assert!(!MemberRole::Volunteer.can_manage());
    }

    #[test]
    fn invite_defaults_to_volunteer() {
        let req: InviteMemberRequest =
            serde_json::from_str(r#"{"email":"sam@example.org"}"#).unwrap();
        assert_eq!(req.role, MemberRole::Volunteer);
        assert!(req.validate().is_ok());
    }
}
