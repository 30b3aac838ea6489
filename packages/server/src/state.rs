use std::sync::Arc;

use common::notify::Notifier;
use common::rate_limit::RateLimitStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// Best-effort delivery of registration notices.
    pub notifier: Arc<dyn Notifier>,
    /// Per-user registration attempt counter. Process-local unless a shared
    /// store is plugged in.
    pub rate_limiter: Arc<dyn RateLimitStore>,
}
