//! Contributor counter upserts shared by the alert and vote adapters.
//!
//! Always called inside the caller's transaction so the counters move with
//! the alert or vote row that earned them. A promotion writes its level-up
//! notification in the same transaction.

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::QueryResult;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::notification::Notification;
use crate::domain::{ContributionChange, UserLevel};

use super::models::{NewContributorRow, NewNotificationRow};
use super::schema::{contributors, notifications};

pub(crate) async fn apply_contribution(
    conn: &mut AsyncPgConnection,
    change: &ContributionChange,
) -> QueryResult<()> {
    let user_id = *change.user_id.as_uuid();
    let seed = NewContributorRow {
        user_id,
        contribution_score: change.score_delta,
        level: UserLevel::for_score(change.score_delta).as_str(),
        total_reports: change.reports_delta,
        verified_reports: change.verified_delta,
    };

    let score: i32 = diesel::insert_into(contributors::table)
        .values(&seed)
        .on_conflict(contributors::user_id)
        .do_update()
        .set((
            contributors::contribution_score
                .eq(contributors::contribution_score + change.score_delta),
            contributors::total_reports.eq(contributors::total_reports + change.reports_delta),
            contributors::verified_reports
                .eq(contributors::verified_reports + change.verified_delta),
        ))
        .returning(contributors::contribution_score)
        .get_result(conn)
        .await?;

    let level = UserLevel::for_score(score);
    diesel::update(contributors::table.find(user_id))
        .set(contributors::level.eq(level.as_str()))
        .execute(conn)
        .await?;

    // A new row starts from zero, so the previous level is always derivable.
    let previous = UserLevel::for_score(score.saturating_sub(change.score_delta));
    if level > previous {
        let note = Notification::level_up(change.user_id, level, Utc::now());
        diesel::insert_into(notifications::table)
            .values(NewNotificationRow::from(&note))
            .execute(conn)
            .await?;
    }
    Ok(())
}
