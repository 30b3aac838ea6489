use sea_orm::sea_query::{Index, IndexCreateStatement, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{leaderboard_entry, registration, role, role_permission};

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &["admin", "participant"];

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    // Admin: all permissions
    ("admin", "event:manage"),
    ("admin", "registration:manage"),
    ("admin", "leaderboard:manage"),
    // Participants only act on their own registrations, which needs no grant.
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(OnConflict::column(role::Column::Name).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => roles_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => perms_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

async fn create_index(
    db: &DatabaseConnection,
    name: &str,
    stmt: &mut IndexCreateStatement,
) -> Result<(), DbErr> {
    let sql = stmt.if_not_exists().name(name).to_string(PostgresQueryBuilder);
    db.execute_unprepared(&sql).await?;
    info!("Ensured index {} exists", name);
    Ok(())
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't create composite indexes, so they are
/// created manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // One registration per (user, event). Registration creation relies on
    // this as the last line of duplicate detection, so failure is fatal.
    create_index(
        db,
        "idx_registration_user_event",
        Index::create()
            .unique()
            .table(registration::Entity)
            .col(registration::Column::UserId)
            .col(registration::Column::EventId),
    )
    .await?;

    // Capacity counting:
    // SELECT COUNT(*) FROM registration WHERE event_id = ? AND status = 'confirmed'
    if let Err(e) = create_index(
        db,
        "idx_registration_event_status",
        Index::create()
            .table(registration::Entity)
            .col(registration::Column::EventId)
            .col(registration::Column::Status),
    )
    .await
    {
        tracing::warn!("Failed to create index idx_registration_event_status: {}", e);
    }

    // Leaderboard reads ordered by score within an event.
    if let Err(e) = create_index(
        db,
        "idx_leaderboard_event_score",
        Index::create()
            .table(leaderboard_entry::Entity)
            .col(leaderboard_entry::Column::EventId)
            .col(leaderboard_entry::Column::Score),
    )
    .await
    {
        tracing::warn!("Failed to create index idx_leaderboard_event_score: {}", e);
    }

    Ok(())
}
