use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "opportunity_type", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityType {
    Event,
    Shift,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "opportunity_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityStatus {
    Draft,
    Published,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Requirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 120))]
    pub min_age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_check: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Opportunity {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: OpportunityType,
    pub status: OpportunityStatus,
    pub location: Option<String>,
    pub address: Option<String>,
    pub is_virtual: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub recurrence: Option<String>,
    pub requirements: Json<Requirements>,
    /// 0 means unlimited.
    pub capacity: i32,
    pub spots_remaining: i32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Opportunity plus the number of APPLIED/APPROVED signups.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OpportunityWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub opportunity: Opportunity,
    pub active_signups: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_create_window"))]
pub struct CreateOpportunityRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(rename = "type", default = "default_type")]
    pub kind: OpportunityType,
    pub location: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub is_virtual: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub recurrence: Option<String>,
    #[validate(nested)]
    pub requirements: Option<Requirements>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub capacity: i32,
    pub tags: Option<Vec<String>>,
}

fn default_type() -> OpportunityType {
    OpportunityType::Event
}

fn validate_create_window(req: &CreateOpportunityRequest) -> Result<(), ValidationError> {
    check_window(Some(req.start_date), req.end_date)
}

/// Partial update. For nullable columns, `clear_*` flags set the column to NULL.
#[derive(Debug, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_window"))]
pub struct UpdateOpportunityRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<OpportunityType>,
    pub status: Option<OpportunityStatus>,
    pub location: Option<String>,
    #[serde(default)]
    pub clear_location: bool,
    pub address: Option<String>,
    #[serde(default)]
    pub clear_address: bool,
    pub is_virtual: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clear_end_date: bool,
    pub recurrence: Option<String>,
    #[serde(default)]
    pub clear_recurrence: bool,
    #[validate(nested)]
    pub requirements: Option<Requirements>,
    #[validate(range(min = 0))]
    pub capacity: Option<i32>,
    pub tags: Option<Vec<String>>,
}

fn validate_update_window(req: &UpdateOpportunityRequest) -> Result<(), ValidationError> {
    check_window(req.start_date, req.end_date)
}

impl UpdateOpportunityRequest {
    /// Checks the dates the row will hold once this update is applied.
    pub fn validate_window_against(&self, current: &Opportunity) -> Result<(), ValidationError> {
        let start = self.start_date.unwrap_or(current.start_date);
        let end = if self.clear_end_date { None } else { self.end_date.or(current.end_date) };
        check_window(Some(start), end)
    }
}

fn check_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ValidationError::new("end_before_start")),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunitySort {
    #[default]
    StartDate,
    CreatedAt,
    Title,
}

impl OpportunitySort {
    pub fn column(self) -> &'static str {
        match self {
            OpportunitySort::StartDate => "o.start_date",
            OpportunitySort::CreatedAt => "o.created_at",
            OpportunitySort::Title => "o.title",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListOpportunitiesQuery {
    #[serde(rename = "type")]
    pub kind: Option<OpportunityType>,
    /// Defaults to PUBLISHED.
    pub status: Option<OpportunityStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    /// Comma-separated; matches opportunities carrying any of the tags.
    pub tags: Option<String>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: OpportunitySort,
    #[serde(default)]
    pub order: SortOrder,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

impl ListOpportunitiesQuery {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_body() -> serde_json::Value {
        serde_json::json!({
            "title": "Community Garden Cleanup",
            "description": "Prepare the garden beds for spring.",
            "start_date": "2026-04-04T09:00:00Z",
            "capacity": 20
        })
    }

    #[test]
    fn create_defaults() {
        let req: CreateOpportunityRequest = serde_json::from_value(create_body()).unwrap();
        assert_eq!(req.kind, OpportunityType::Event);
        assert!(!req.is_virtual);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn negative_capacity_is_rejected() {
        let mut body = create_body();
        body["capacity"] = serde_json::json!(-1);
        let req: CreateOpportunityRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let start = Utc::now();
        let req = UpdateOpportunityRequest {
            start_date: Some(start),
            end_date: Some(start - Duration::hours(1)),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn tag_list_splits_and_trims() {
        let q = ListOpportunitiesQuery {
            tags: Some("outdoor, gardening,,".into()),
            ..Default::default()
        };
        assert_eq!(q.tag_list(), vec!["outdoor", "gardening"]);
        assert!(ListOpportunitiesQuery::default().tag_list().is_empty());
    }

    #[test]
    fn requirements_round_trip_omits_empty_fields() {
        let req = Requirements { min_age: Some(14), ..Default::default() };
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"min_age":14}"#);
    }

    fn stored(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Opportunity {
        Opportunity {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            title: "Shift".into(),
            description: "Sort donations".into(),
            kind: OpportunityType::Shift,
            status: OpportunityStatus::Published,
            location: None,
            address: None,
            is_virtual: false,
            start_date: start,
            end_date: end,
            recurrence: None,
            requirements: Json(Requirements::default()),
            capacity: 0,
            spots_remaining: 0,
            tags: Vec::new(),
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn end_only_update_is_checked_against_stored_start() {
        let start = Utc::now();
        let current = stored(start, None);

        let req = UpdateOpportunityRequest {
            end_date: Some(start - Duration::hours(2)),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        let err = req.validate_window_against(&current).unwrap_err();
        assert_eq!(err.code, "end_before_start");

        let req = UpdateOpportunityRequest {
            end_date: Some(start + Duration::hours(2)),
            ..Default::default()
        };
        assert!(req.validate_window_against(&current).is_ok());
    }

    #[test]
    fn start_moved_past_stored_end_is_rejected() {
        let start = Utc::now();
        let current = stored(start, Some(start + Duration::hours(3)));

        let req = UpdateOpportunityRequest {
            start_date: Some(start + Duration::hours(4)),
            ..Default::default()
        };
        assert!(req.validate_window_against(&current).is_err());

        let req = UpdateOpportunityRequest {
            start_date: Some(start + Duration::hours(4)),
            clear_end_date: true,
            ..Default::default()
        };
        assert!(req.validate_window_against(&current).is_ok());
    }
}
