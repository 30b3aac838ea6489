//! Event registration: duplicate guard, capacity counting and the
//! confirmed/waitlisted decision, plus the transactional creator that ties
//! them together.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::RegistrationStatus;
use common::capacity::status_for_capacity;
use common::notify::{Notifier, RegistrationNotice, dispatch_registration_notice};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionSession, TransactionTrait,
};
use tracing::{debug, info};

use crate::entity::{event, registration, user};
use crate::error::AppError;
use crate::models::registration::validate_registration_fields;
use crate::utils::event::{find_event, find_event_for_update};

/// Number of registrations for `event_id` in the given status.
pub async fn count_by_status<C: ConnectionTrait>(
    conn: &C,
    event_id: i32,
    status: RegistrationStatus,
) -> Result<u64, AppError> {
    let count = registration::Entity::find()
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::Status.eq(status))
        .count(conn)
        .await?;
    Ok(count)
}

/// Number of registrations currently holding one of the event's slots.
pub async fn confirmed_count<C: ConnectionTrait>(conn: &C, event_id: i32) -> Result<u64, AppError> {
    let count = registration::Entity::find()
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::Status.is_in(RegistrationStatus::slot_holding()))
        .count(conn)
        .await?;
    Ok(count)
}

/// Whether `user_id` already has a registration for `event_id`, in any status.
pub async fn has_existing_registration<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    event_id: i32,
) -> Result<bool, AppError> {
    let count = registration::Entity::find()
        .filter(registration::Column::UserId.eq(user_id))
        .filter(registration::Column::EventId.eq(event_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Status a registration made now would receive.
///
/// Read-then-decide only; callers that insert must hold the event lock.
pub async fn resolve_status<C: ConnectionTrait>(
    conn: &C,
    event_id: i32,
) -> Result<RegistrationStatus, AppError> {
    let event = find_event(conn, event_id).await?;
    let confirmed = confirmed_count(conn, event_id).await?;
    Ok(status_for_capacity(event.max_participants, confirmed))
}

/// Input for [`RegistrationService::register`].
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub user_id: i32,
    pub event_id: i32,
    pub team_name: String,
    pub project_idea: String,
}

pub struct RegistrationService<'a> {
    conn: &'a DatabaseConnection,
    notifier: Option<(Arc<dyn Notifier>, Duration)>,
}

impl<'a> RegistrationService<'a> {
    pub fn new(conn: &'a DatabaseConnection) -> Self {
        Self {
            conn,
            notifier: None,
        }
    }

    /// Send a notice through `notifier` after each successful registration.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        self.notifier = Some((notifier, timeout));
        self
    }

    /// Register a user for an event.
    ///
    /// Checks, in order: non-blank `team_name`/`project_idea`, event exists,
    /// registration open, no prior registration. The checks, the status
    /// decision and the insert run in one transaction holding the event's
    /// row lock, so concurrent registrations for one event are serialized.
    /// The unique (user_id, event_id) index backs up the duplicate check.
    pub async fn register(&self, new: NewRegistration) -> Result<registration::Model, AppError> {
        validate_registration_fields(&new.team_name, &new.project_idea)?;

        let txn = self.conn.begin().await?;
        let event = find_event_for_update(&txn, new.event_id).await?;

        if !event.registration_open {
            return Err(AppError::RegistrationClosed);
        }

        if has_existing_registration(&txn, new.user_id, new.event_id).await? {
            return Err(AppError::DuplicateRegistration);
        }

        let account = user::Entity::find_by_id(new.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let status = resolve_status(&txn, event.id).await?;

        let active = registration::ActiveModel {
            user_id: Set(new.user_id),
            event_id: Set(new.event_id),
            team_name: Set(new.team_name.trim().to_string()),
            project_idea: Set(new.project_idea.trim().to_string()),
            status: Set(status),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = match active.insert(&txn).await {
            Ok(model) => model,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!("Registration race condition: unique constraint caught on insert");
                return Err(AppError::DuplicateRegistration);
            }
            Err(e) => return Err(e.into()),
        };
        txn.commit().await?;

        info!(
            registration_id = model.id,
            user_id = model.user_id,
            event_id = model.event_id,
            status = %model.status,
            "Registration created"
        );

        self.notify(&model, account.username, &event);
        Ok(model)
    }

    fn notify(&self, model: &registration::Model, username: String, event: &event::Model) {
        let Some((notifier, timeout)) = &self.notifier else {
            return;
        };
        let notice = RegistrationNotice {
            registration_id: model.id,
            user_id: model.user_id,
            username,
            event_id: event.id,
            event_title: event.title.clone(),
            team_name: model.team_name.clone(),
            status: model.status,
            created_at: model.created_at,
        };
        // Detached: delivery outcome is only logged.
        drop(dispatch_registration_notice(
            Arc::clone(notifier),
            notice,
            *timeout,
        ));
    }

    /// Administrative status override. Does not touch any other registration.
    pub async fn update_status(
        &self,
        registration_id: i32,
        status: RegistrationStatus,
    ) -> Result<registration::Model, AppError> {
        let txn = self.conn.begin().await?;
        let existing = registration::Entity::find_by_id(registration_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration not found".into()))?;
        find_event_for_update(&txn, existing.event_id).await?;

        if existing.status == status {
            return Ok(existing);
        }

        let previous = existing.status;
        let mut active: registration::ActiveModel = existing.into();
        active.status = Set(status);
        let model = active.update(&txn).await?;
        txn.commit().await?;

        info!(
            registration_id,
            from = %previous,
            to = %status,
            "Registration status changed"
        );
        Ok(model)
    }

    /// Registrations for an event with the registrant's username, oldest first.
    pub async fn list_for_event(
        &self,
        event_id: i32,
        status: Option<RegistrationStatus>,
    ) -> Result<Vec<(registration::Model, Option<user::Model>)>, AppError> {
        find_event(self.conn, event_id).await?;

        let mut select = registration::Entity::find()
            .filter(registration::Column::EventId.eq(event_id));
        if let Some(status) = status {
            select = select.filter(registration::Column::Status.eq(status));
        }

        let rows = select
            .find_also_related(user::Entity)
            .order_by_asc(registration::Column::CreatedAt)
            .order_by_asc(registration::Column::Id)
            .all(self.conn)
            .await?;
        Ok(rows)
    }

    /// All registrations of one user, newest first.
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<registration::Model>, AppError> {
        let rows = registration::Entity::find()
            .filter(registration::Column::UserId.eq(user_id))
            .order_by_desc(registration::Column::CreatedAt)
            .all(self.conn)
            .await?;
        Ok(rows)
    }
}
