use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_required_text, validate_title};
use crate::error::AppError;

const MAX_DESCRIPTION_CHARS: usize = 100_000;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEventRequest {
    #[schema(example = "Spring Hack 2026")]
    pub title: String,
    /// Markdown description.
    pub description: String,
    /// Number of confirmed registrations accepted before new ones are waitlisted.
    #[schema(example = 100)]
    pub max_participants: i32,
    /// Defaults to true.
    pub registration_open: Option<bool>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Lowering capacity never demotes existing confirmed registrations.
    pub max_participants: Option<i32>,
    pub registration_open: Option<bool>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct EventListQuery {
    /// Page number (1-based). Default: 1.
    pub page: Option<u64>,
    /// Items per page (1-100). Default: 20.
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    /// One of `created_at`, `start_time`, `title`. Default: `start_time`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`. Default: `desc`.
    pub sort_order: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub max_participants: i32,
    pub registration_open: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event details plus current registration counts.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub confirmed_count: u64,
    pub waitlisted_count: u64,
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct EventListItem {
    pub id: i32,
    pub title: String,
    pub max_participants: i32,
    pub registration_open: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListResponse {
    pub data: Vec<EventListItem>,
    pub pagination: Pagination,
}

impl From<crate::entity::event::Model> for EventResponse {
    fn from(m: crate::entity::event::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            max_participants: m.max_participants,
            registration_open: m.registration_open,
            start_time: m.start_time,
            end_time: m.end_time,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

fn validate_description(description: &str) -> Result<(), AppError> {
    validate_required_text("description", description, MAX_DESCRIPTION_CHARS)
}

fn validate_max_participants(max: i32) -> Result<(), AppError> {
    if max <= 0 {
        return Err(AppError::Validation(
            "max_participants must be greater than 0".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_event(req: &CreateEventRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    validate_description(&req.description)?;
    validate_max_participants(req.max_participants)?;
    if req.end_time <= req.start_time {
        return Err(AppError::Validation(
            "end_time must be after start_time".into(),
        ));
    }
    Ok(())
}

pub fn validate_update_event(req: &UpdateEventRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(ref description) = req.description {
        validate_description(description)?;
    }
    if let Some(max) = req.max_participants {
        validate_max_participants(max)?;
    }
    if let (Some(start), Some(end)) = (req.start_time, req.end_time)
        && end <= start
    {
        return Err(AppError::Validation(
            "end_time must be after start_time".into(),
        ));
    }
    Ok(())
}
