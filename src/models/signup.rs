use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::member::TenantSummary;
use super::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "signup_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignupStatus {
    Applied,
    Approved,
    Waitlisted,
    Declined,
    Completed,
    Cancelled,
}

/// Effect of a status transition on the opportunity's `spots_remaining`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotChange {
    Claim,
    Release,
    Unchanged,
}

impl SignupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SignupStatus::Applied => "APPLIED",
            SignupStatus::Approved => "APPROVED",
            SignupStatus::Waitlisted => "WAITLISTED",
            SignupStatus::Declined => "DECLINED",
            SignupStatus::Completed => "COMPLETED",
            SignupStatus::Cancelled => "CANCELLED",
        }
    }

    /// A completed signup keeps the spot it was approved into.
    pub fn holds_spot(self) -> bool {
        matches!(self, SignupStatus::Approved | SignupStatus::Completed)
    }

    pub fn spot_change(self, to: SignupStatus) -> SpotChange {
        match (self.holds_spot(), to.holds_spot()) {
            (false, true) => SpotChange::Claim,
            (true, false) => SpotChange::Release,
            _ => SpotChange::Unchanged,
        }
    }

    /// `approved_at` is set when a spot is first claimed, not when a completed
    /// signup is moved back to approved.
    pub fn stamps_approval(self, to: SignupStatus) -> bool {
        to == SignupStatus::Approved && !self.holds_spot()
    }

    pub fn stamps_completion(self, to: SignupStatus) -> bool {
        to == SignupStatus::Completed && self != SignupStatus::Completed
    }

    /// Only approved volunteers can complete an opportunity.
    pub fn can_transition_to(self, to: SignupStatus) -> bool {
        match to {
            SignupStatus::Completed => self.holds_spot(),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Signup {
    pub id: Uuid,
    pub opportunity_id: Uuid,
    pub user_id: Uuid,
    pub status: SignupStatus,
    pub applied_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Signup joined with its volunteer and opportunity, for coordinator views.
#[derive(Debug, FromRow)]
pub struct SignupDetailRow {
    #[sqlx(flatten)]
    pub signup: Signup,
    pub user_email: String,
    pub user_name: Option<String>,
    pub user_avatar_url: Option<String>,
    pub opportunity_title: String,
    pub opportunity_start_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OpportunityRef {
    pub id: Uuid,
    pub title: String,
    pub start_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SignupDetail {
    #[serde(flatten)]
    pub signup: Signup,
    pub user: UserSummary,
    pub opportunity: OpportunityRef,
}

impl From<SignupDetailRow> for SignupDetail {
    fn from(row: SignupDetailRow) -> Self {
        Self {
            user: UserSummary {
                id: row.signup.user_id,
                email: row.user_email,
                name: row.user_name,
                avatar_url: row.user_avatar_url,
            },
            opportunity: OpportunityRef {
                id: row.signup.opportunity_id,
                title: row.opportunity_title,
                start_date: row.opportunity_start_date,
            },
            signup: row.signup,
        }
    }
}

/// Signup joined with its opportunity and tenant, for the volunteer's own list.
#[derive(Debug, FromRow)]
pub struct MySignupRow {
    #[sqlx(flatten)]
    pub signup: Signup,
    pub opportunity_title: String,
    pub opportunity_start_date: DateTime<Utc>,
    pub tenant_id: Uuid,
    pub tenant_slug: String,
    pub tenant_name: String,
    pub tenant_logo: Option<String>,
    pub tenant_primary_color: String,
    pub tenant_accent_color: String,
}

#[derive(Debug, Serialize)]
pub struct MySignup {
    #[serde(flatten)]
    pub signup: Signup,
    pub opportunity: OpportunityRef,
    pub tenant: TenantSummary,
}

impl From<MySignupRow> for MySignup {
    fn from(row: MySignupRow) -> Self {
        Self {
            opportunity: OpportunityRef {
                id: row.signup.opportunity_id,
                title: row.opportunity_title,
                start_date: row.opportunity_start_date,
            },
            tenant: TenantSummary {
                id: row.tenant_id,
                slug: row.tenant_slug,
                name: row.tenant_name,
                logo: row.tenant_logo,
                primary_color: row.tenant_primary_color,
                accent_color: row.tenant_accent_color,
            },
            signup: row.signup,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ApplyRequest {
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSignupRequest {
    pub status: SignupStatus,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListSignupsQuery {
    pub opportunity_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub status: Option<SignupStatus>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct MySignupsQuery {
    /// Without a filter, cancelled signups are hidden.
    pub status: Option<SignupStatus>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::SignupStatus::*;
    use super::*;

    const ALL: [SignupStatus; 6] = [Applied, Approved, Waitlisted, Declined, Completed, Cancelled];

    #[test]
    fn approving_claims_once() {
        assert_eq!(Applied.spot_change(Approved), SpotChange::Claim);
        assert_eq!(Waitlisted.spot_change(Approved), SpotChange::Claim);
        assert_eq!(Approved.spot_change(Approved), SpotChange::Unchanged);
    }

    #[test]
    fn leaving_approved_releases() {
        for to in [Applied, Waitlisted, Declined, Cancelled] {
            assert_eq!(Approved.spot_change(to), SpotChange::Release, "{to:?}");
        }
        assert_eq!(Approved.spot_change(Completed), SpotChange::Unchanged);
        assert_eq!(Completed.spot_change(Cancelled), SpotChange::Release);
    }

    #[test]
    fn non_holding_transitions_leave_counter_alone() {
        for from in [Applied, Waitlisted, Declined, Cancelled] {
            for to in [Applied, Waitlisted, Declined, Cancelled] {
                assert_eq!(from.spot_change(to), SpotChange::Unchanged);
            }
        }
    }

    #[test]
    fn any_round_trip_nets_to_zero() {
        for a in ALL {
            for b in ALL {
                let delta = |c: SpotChange| match c {
                    SpotChange::Claim => 1,
                    SpotChange::Release => -1,
                    SpotChange::Unchanged => 0,
                };
                assert_eq!(delta(a.spot_change(b)) + delta(b.spot_change(a)), 0);
            }
        }
    }

    #[test]
    fn approval_timestamp_only_on_claim() {
        assert!(Applied.stamps_approval(Approved));
        assert!(Declined.stamps_approval(Approved));
        assert!(!Approved.stamps_approval(Approved));
        assert!(!Completed.stamps_approval(Approved));
        assert!(Approved.stamps_completion(Completed));
        assert!(!Completed.stamps_completion(Completed));
    }

    #[test]
    fn completion_requires_approval() {
        assert!(Approved.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Completed));
        assert!(!Applied.can_transition_to(Completed));
        assert!(!Waitlisted.can_transition_to(Completed));
        assert!(Declined.can_transition_to(Approved));
    }
}
