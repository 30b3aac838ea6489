use sea_orm::{DatabaseTransaction, EntityTrait, QuerySelect, sea_query::LockType};

use crate::entity::event;
use crate::error::AppError;

/// Look up an event by ID, returning 404 if not found.
pub async fn find_event<C: sea_orm::ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Look up an event and take a row lock on it for the rest of `txn`.
///
/// Every write that depends on an event's registrations or leaderboard goes
/// through this lock, so those writes are serialized per event.
pub async fn find_event_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}
