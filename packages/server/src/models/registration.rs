use chrono::{DateTime, Utc};
use common::RegistrationStatus;
use serde::{Deserialize, Serialize};

use super::shared::validate_required_text;
use crate::error::AppError;

pub const MAX_TEAM_NAME_CHARS: usize = 128;
pub const MAX_PROJECT_IDEA_CHARS: usize = 4000;

/// Request body for registering into the event named in the path.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRegistrationRequest {
    #[schema(example = "Team A")]
    pub team_name: String,
    #[schema(example = "A bot that books meeting rooms")]
    pub project_idea: String,
}

/// Request body for registering with the event given in the body.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterForEventRequest {
    #[schema(example = 1)]
    pub event_id: i32,
    #[schema(example = "Team A")]
    pub team_name: String,
    #[schema(example = "A bot that books meeting rooms")]
    pub project_idea: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateRegistrationStatusRequest {
    pub status: RegistrationStatus,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct RegistrationListQuery {
    /// Only return registrations with this status.
    pub status: Option<RegistrationStatus>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RegistrationResponse {
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
    pub team_name: String,
    pub project_idea: String,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

/// A registration as seen by event administrators.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EventRegistrationItem {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub team_name: String,
    pub project_idea: String,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::registration::Model> for RegistrationResponse {
    fn from(m: crate::entity::registration::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            event_id: m.event_id,
            team_name: m.team_name,
            project_idea: m.project_idea,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

/// Check the free-text fields of a registration.
pub fn validate_registration_fields(team_name: &str, project_idea: &str) -> Result<(), AppError> {
    validate_required_text("team_name", team_name, MAX_TEAM_NAME_CHARS)?;
    validate_required_text("project_idea", project_idea, MAX_PROJECT_IDEA_CHARS)
}
