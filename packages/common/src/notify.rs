use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::RegistrationStatus;

/// Message sent to a participant after their registration is stored.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationNotice {
    pub registration_id: i32,
    pub user_id: i32,
    pub username: String,
    pub event_id: i32,
    pub event_title: String,
    pub team_name: String,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
}

/// Best-effort outbound notifications (e-mail, chat, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a registration confirmation or waitlist notice.
    async fn registration_created(&self, notice: &RegistrationNotice) -> Result<(), NotifyError>;
}

/// Notifier that only writes the notice to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn registration_created(&self, notice: &RegistrationNotice) -> Result<(), NotifyError> {
        info!(
            registration_id = notice.registration_id,
            user = %notice.username,
            event = %notice.event_title,
            status = %notice.status,
            "Registration notice"
        );
        Ok(())
    }
}

/// Send `notice` on a background task, giving up after `timeout`.
///
/// Failures are logged and never reported back to the caller.
pub fn dispatch_registration_notice(
    notifier: Arc<dyn Notifier>,
    notice: RegistrationNotice,
    timeout: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let result = match tokio::time::timeout(timeout, notifier.registration_created(&notice)).await
        {
            Ok(inner) => inner,
            Err(_) => Err(NotifyError::Timeout(timeout)),
        };
        if let Err(e) = result {
            warn!(
                registration_id = notice.registration_id,
                error = %e,
                "Failed to deliver registration notice"
            );
        }
    })
}
