use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::leaderboard::*;
use crate::services::leaderboard::LeaderboardService;
use crate::state::AppState;

async fn upsert(
    state: &AppState,
    auth_user: &AuthUser,
    event_id: i32,
    user_id: i32,
    score: i32,
) -> Result<LeaderboardEntryResponse, AppError> {
    auth_user.require_permission("leaderboard:manage")?;

    let model = LeaderboardService::new(&state.db, state.config.leaderboard.ranking)
        .upsert_score(event_id, user_id, score)
        .await?;
    Ok(model.into())
}

#[utoipa::path(
    get,
    path = "/events/{id}/leaderboard",
    tag = "Leaderboard",
    operation_id = "getLeaderboard",
    summary = "Get an event's leaderboard",
    description = "Returns all entries ordered by rank, ties broken by user ID. Public.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Leaderboard", body = LeaderboardResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let rows = LeaderboardService::new(&state.db, state.config.leaderboard.ranking)
        .standings(id)
        .await?;

    let entries = rows
        .into_iter()
        .map(|(entry, account)| LeaderboardRow {
            user_id: entry.user_id,
            username: account.map(|u| u.username).unwrap_or_default(),
            score: entry.score,
            rank: entry.rank,
            updated_at: entry.updated_at,
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        event_id: id,
        entries,
    }))
}

#[utoipa::path(
    post,
    path = "/events/{id}/leaderboard",
    tag = "Leaderboard",
    operation_id = "upsertEventScore",
    summary = "Set a user's score for an event",
    description = "Inserts or replaces the score and recalculates every rank of the event. Requires `leaderboard:manage` permission.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpsertScoreRequest,
    responses(
        (status = 200, description = "Entry after recalculation", body = LeaderboardEntryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = payload.user_id, score = payload.score))]
pub async fn upsert_event_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpsertScoreRequest>,
) -> Result<Json<LeaderboardEntryResponse>, AppError> {
    let entry = upsert(&state, &auth_user, id, payload.user_id, payload.score).await?;
    Ok(Json(entry))
}

#[utoipa::path(
    post,
    path = "/leaderboard",
    tag = "Leaderboard",
    operation_id = "upsertLeaderboard",
    summary = "Set a user's score for the event named in the body",
    request_body = UpsertLeaderboardRequest,
    responses(
        (status = 200, description = "Entry after recalculation", body = LeaderboardEntryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event or user not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id = payload.event_id, user_id = payload.user_id))]
pub async fn upsert_leaderboard(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpsertLeaderboardRequest>,
) -> Result<Json<LeaderboardEntryResponse>, AppError> {
    let entry = upsert(
        &state,
        &auth_user,
        payload.event_id,
        payload.user_id,
        payload.score,
    )
    .await?;
    Ok(Json(entry))
}
