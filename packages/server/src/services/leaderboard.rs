use chrono::Utc;
use common::RankingScheme;
use common::ranking::assign_ranks;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionSession, TransactionTrait,
};
use tracing::{debug, info};

use crate::entity::{leaderboard_entry, user};
use crate::error::AppError;
use crate::models::leaderboard::validate_score;
use crate::utils::event::{find_event, find_event_for_update};

/// Reassign ranks for every entry of `event_id` from the current scores.
///
/// Entries are ordered by score descending, then user id, and only rows
/// whose rank changed are written. Running it twice without a score change
/// writes nothing the second time. Must run while the event row is locked.
pub async fn recalculate_ranks<C: ConnectionTrait>(
    conn: &C,
    event_id: i32,
    scheme: RankingScheme,
) -> Result<(), AppError> {
    let entries = leaderboard_entry::Entity::find()
        .filter(leaderboard_entry::Column::EventId.eq(event_id))
        .order_by_desc(leaderboard_entry::Column::Score)
        .order_by_asc(leaderboard_entry::Column::UserId)
        .all(conn)
        .await?;

    let scores: Vec<i32> = entries.iter().map(|e| e.score).collect();
    let ranks = assign_ranks(&scores, scheme);

    let mut changed = 0usize;
    for (entry, rank) in entries.into_iter().zip(ranks) {
        if entry.rank == rank {
            continue;
        }
        let mut active: leaderboard_entry::ActiveModel = entry.into();
        active.rank = Set(rank);
        active.update(conn).await?;
        changed += 1;
    }

    debug!(event_id, changed, ?scheme, "Recalculated leaderboard ranks");
    Ok(())
}

pub struct LeaderboardService<'a> {
    conn: &'a DatabaseConnection,
    scheme: RankingScheme,
}

impl<'a> LeaderboardService<'a> {
    pub fn new(conn: &'a DatabaseConnection, scheme: RankingScheme) -> Self {
        Self { conn, scheme }
    }

    /// Insert or replace a user's score and recalculate the event's ranks.
    ///
    /// Both steps share one transaction under the event row lock, so the
    /// returned rank is consistent with every other entry of the event.
    pub async fn upsert_score(
        &self,
        event_id: i32,
        user_id: i32,
        score: i32,
    ) -> Result<leaderboard_entry::Model, AppError> {
        validate_score(score)?;

        let txn = self.conn.begin().await?;
        find_event_for_update(&txn, event_id).await?;

        user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let entry = leaderboard_entry::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user_id),
            score: Set(score),
            rank: Set(0),
            updated_at: Set(Utc::now()),
        };
        leaderboard_entry::Entity::insert(entry)
            .on_conflict(
                OnConflict::columns([
                    leaderboard_entry::Column::EventId,
                    leaderboard_entry::Column::UserId,
                ])
                .update_columns([
                    leaderboard_entry::Column::Score,
                    leaderboard_entry::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        recalculate_ranks(&txn, event_id, self.scheme).await?;

        let model = leaderboard_entry::Entity::find_by_id((event_id, user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Internal("Leaderboard entry vanished after upsert".into()))?;
        txn.commit().await?;

        info!(event_id, user_id, score, rank = model.rank, "Leaderboard score upserted");
        Ok(model)
    }

    /// Current standings with usernames, best rank first.
    pub async fn standings(
        &self,
        event_id: i32,
    ) -> Result<Vec<(leaderboard_entry::Model, Option<user::Model>)>, AppError> {
        find_event(self.conn, event_id).await?;

        let rows = leaderboard_entry::Entity::find()
            .filter(leaderboard_entry::Column::EventId.eq(event_id))
            .find_also_related(user::Entity)
            .order_by_asc(leaderboard_entry::Column::Rank)
            .order_by_asc(leaderboard_entry::Column::UserId)
            .all(self.conn)
            .await?;
        Ok(rows)
    }
}
