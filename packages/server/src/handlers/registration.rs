use std::time::Duration;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::rate_limit::RateDecision;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::registration::*;
use crate::services::registration::{NewRegistration, RegistrationService};
use crate::state::AppState;

const RATE_WINDOW: Duration = Duration::from_secs(60);

async fn check_rate_limit(state: &AppState, user_id: i32) -> Result<(), AppError> {
    let key = format!("registration:{}", user_id);
    let limit = state.config.rate_limit.registrations_per_minute;
    if limit == 0 {
        return Ok(());
    }
    match state.rate_limiter.hit(&key, limit, RATE_WINDOW).await {
        RateDecision::Allowed { .. } => Ok(()),
        RateDecision::Limited { retry_after } => {
            info!(user_id, "Registration rate limited");
            Err(AppError::RateLimited {
                retry_after: retry_after.as_secs().max(1),
            })
        }
    }
}

async fn create_for_user(
    state: &AppState,
    auth_user: &AuthUser,
    event_id: i32,
    team_name: String,
    project_idea: String,
) -> Result<RegistrationResponse, AppError> {
    check_rate_limit(state, auth_user.user_id).await?;

    let mut service = RegistrationService::new(&state.db);
    if state.config.notification.enabled {
        service = service.with_notifier(
            state.notifier.clone(),
            Duration::from_millis(state.config.notification.timeout_ms),
        );
    }

    let model = service
        .register(NewRegistration {
            user_id: auth_user.user_id,
            event_id,
            team_name,
            project_idea,
        })
        .await?;
    Ok(model.into())
}

#[utoipa::path(
    post,
    path = "/events/{id}/registrations",
    tag = "Registrations",
    operation_id = "registerForEvent",
    summary = "Register the current user for an event",
    description = "Creates a registration for the authenticated user. The status is `confirmed` while the event has free slots and `waitlisted` once `max_participants` confirmed registrations exist.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = CreateRegistrationRequest,
    responses(
        (status = 201, description = "Registration created", body = RegistrationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Registration closed or already registered (REGISTRATION_CLOSED, DUPLICATE_REGISTRATION)", body = ErrorBody),
        (status = 429, description = "Too many attempts (RATE_LIMITED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn register_for_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateRegistrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response =
        create_for_user(&state, &auth_user, id, payload.team_name, payload.project_idea).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/registrations",
    tag = "Registrations",
    operation_id = "createRegistration",
    summary = "Register the current user for the event named in the body",
    description = "Same behavior as `POST /events/{id}/registrations`, with the event taken from `event_id`.",
    request_body = RegisterForEventRequest,
    responses(
        (status = 201, description = "Registration created", body = RegistrationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Registration closed or already registered (REGISTRATION_CLOSED, DUPLICATE_REGISTRATION)", body = ErrorBody),
        (status = 429, description = "Too many attempts (RATE_LIMITED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, event_id = payload.event_id))]
pub async fn create_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterForEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = create_for_user(
        &state,
        &auth_user,
        payload.event_id,
        payload.team_name,
        payload.project_idea,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/registrations/me",
    tag = "Registrations",
    operation_id = "listMyRegistrations",
    summary = "List the current user's registrations",
    responses(
        (status = 200, description = "Registrations, newest first", body = Vec<RegistrationResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_my_registrations(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RegistrationResponse>>, AppError> {
    let rows = RegistrationService::new(&state.db)
        .list_for_user(auth_user.user_id)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/events/{id}/registrations",
    tag = "Registrations",
    operation_id = "listEventRegistrations",
    summary = "List registrations for an event",
    description = "Requires `registration:manage` permission. Optionally filtered by status.",
    params(("id" = i32, Path, description = "Event ID"), RegistrationListQuery),
    responses(
        (status = 200, description = "Registrations, oldest first", body = Vec<EventRegistrationItem>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_event_registrations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<RegistrationListQuery>,
) -> Result<Json<Vec<EventRegistrationItem>>, AppError> {
    auth_user.require_permission("registration:manage")?;

    let rows = RegistrationService::new(&state.db)
        .list_for_event(id, query.status)
        .await?;

    let items = rows
        .into_iter()
        .map(|(reg, account)| EventRegistrationItem {
            id: reg.id,
            user_id: reg.user_id,
            username: account.map(|u| u.username).unwrap_or_default(),
            team_name: reg.team_name,
            project_idea: reg.project_idea,
            status: reg.status,
            created_at: reg.created_at,
        })
        .collect();
    Ok(Json(items))
}

#[utoipa::path(
    patch,
    path = "/registrations/{id}/status",
    tag = "Registrations",
    operation_id = "updateRegistrationStatus",
    summary = "Override a registration's status",
    description = "Requires `registration:manage` permission. Waitlisted registrations are not promoted automatically.",
    params(("id" = i32, Path, description = "Registration ID")),
    request_body = UpdateRegistrationStatusRequest,
    responses(
        (status = 200, description = "Registration updated", body = RegistrationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(status = %payload.status))]
pub async fn update_registration_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRegistrationStatusRequest>,
) -> Result<Json<RegistrationResponse>, AppError> {
    auth_user.require_permission("registration:manage")?;

    let model = RegistrationService::new(&state.db)
        .update_status(id, payload.status)
        .await?;
    Ok(Json(model.into()))
}
