use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Score upsert for the event named in the path.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpsertScoreRequest {
    #[schema(example = 42)]
    pub user_id: i32,
    #[schema(example = 80)]
    pub score: i32,
}

/// Score upsert with the event given in the body.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpsertLeaderboardRequest {
    #[schema(example = 1)]
    pub event_id: i32,
    #[schema(example = 42)]
    pub user_id: i32,
    #[schema(example = 80)]
    pub score: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LeaderboardEntryResponse {
    pub event_id: i32,
    pub user_id: i32,
    pub score: i32,
    /// Recalculated after every score change; ties share a rank.
    pub rank: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LeaderboardRow {
    pub user_id: i32,
    pub username: String,
    pub score: i32,
    pub rank: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LeaderboardResponse {
    pub event_id: i32,
    pub entries: Vec<LeaderboardRow>,
}

impl From<crate::entity::leaderboard_entry::Model> for LeaderboardEntryResponse {
    fn from(m: crate::entity::leaderboard_entry::Model) -> Self {
        Self {
            event_id: m.event_id,
            user_id: m.user_id,
            score: m.score,
            rank: m.rank,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_score(score: i32) -> Result<(), AppError> {
    if score < 0 {
        return Err(AppError::Validation("score must be >= 0".into()));
    }
    Ok(())
}
