use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{auth, event, leaderboard, registration};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth_routes())
        .merge(event_routes())
        .merge(registration_routes())
        .merge(leaderboard_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register_user))
        .routes(routes!(auth::login))
        .routes(routes!(auth::me))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(event::list_events, event::create_event))
        .routes(routes!(
            event::get_event,
            event::update_event,
            event::delete_event
        ))
}

fn registration_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            registration::register_for_event,
            registration::list_event_registrations
        ))
        .routes(routes!(registration::create_registration))
        .routes(routes!(registration::list_my_registrations))
        .routes(routes!(registration::update_registration_status))
}

fn leaderboard_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            leaderboard::get_leaderboard,
            leaderboard::upsert_event_score
        ))
        .routes(routes!(leaderboard::upsert_leaderboard))
}
