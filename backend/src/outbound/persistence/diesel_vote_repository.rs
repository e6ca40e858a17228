//! PostgreSQL-backed `VoteRepository`.
//!
//! Each change locks the alert row, mutates `alert_votes` and moves the
//! denormalised counters in one transaction, so `upvotes`/`downvotes` always
//! equal the vote rows.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::alert::{AlertStatus, AlertTally};
use crate::domain::ports::{VoteRepository, VoteRepositoryError};
use crate::domain::{AlertId, ContributionChange, UserId, Vote, VoteChange, VoteDirection};

use super::contribution_updates::apply_contribution;
use super::error_mapping::ErrorKinds;
use super::models::{AlertRow, NewVoteRow, counter_from_db};
use super::pool::DbPool;
use super::schema::{alert_votes, alerts};

fn errors() -> ErrorKinds<VoteRepositoryError> {
    ErrorKinds {
        query: VoteRepositoryError::query,
        connection: VoteRepositoryError::connection,
        conflict: Some(VoteRepositoryError::conflict),
    }
}

/// Failure inside the vote transaction: a database error or a lost race.
#[derive(Debug)]
enum VoteTxError {
    Database(diesel::result::Error),
    Conflict(&'static str),
}

impl From<diesel::result::Error> for VoteTxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

fn map_tx_error(error: VoteTxError) -> VoteRepositoryError {
    match error {
        VoteTxError::Database(err) => errors().diesel(err),
        VoteTxError::Conflict(message) => VoteRepositoryError::conflict(message),
    }
}

/// Stored status text of an alert that may still take new or flipped votes.
fn accepts_votes(status: &str) -> bool {
    !AlertStatus::parse(status).is_some_and(|status| status.is_terminal())
}

fn ensure_one(rows: usize, message: &'static str) -> Result<(), VoteTxError> {
    if rows == 0 {
        return Err(VoteTxError::Conflict(message));
    }
    Ok(())
}

async fn write_vote_row(
    conn: &mut AsyncPgConnection,
    alert_id: Uuid,
    user_id: Uuid,
    change: VoteChange,
) -> Result<(), VoteTxError> {
    let this_vote = alert_votes::table
        .filter(alert_votes::alert_id.eq(alert_id))
        .filter(alert_votes::user_id.eq(user_id));

    match change {
        VoteChange::Cast {
            direction,
            voter_bonus,
        } => {
            let inserted = diesel::insert_into(alert_votes::table)
                .values(NewVoteRow {
                    alert_id,
                    user_id,
                    is_upvote: direction.is_upvote(),
                })
                .on_conflict_do_nothing()
                .execute(conn)
                .await?;
            ensure_one(inserted, "vote already recorded")?;
            apply_contribution(
                conn,
                &ContributionChange::score(UserId::from_uuid(user_id), voter_bonus),
            )
            .await?;
        }
        VoteChange::Flip { to } => {
            let flipped = diesel::update(
                this_vote.filter(alert_votes::is_upvote.eq(to.opposite().is_upvote())),
            )
            .set(alert_votes::is_upvote.eq(to.is_upvote()))
            .execute(conn)
            .await?;
            ensure_one(flipped, "vote no longer flippable")?;
        }
        VoteChange::Retract { direction } => {
            let deleted =
                diesel::delete(this_vote.filter(alert_votes::is_upvote.eq(direction.is_upvote())))
                    .execute(conn)
                    .await?;
            ensure_one(deleted, "vote no longer present")?;
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct DieselVoteRepository {
    pool: DbPool,
}

impl DieselVoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteRepository for DieselVoteRepository {
    async fn find_vote(
        &self,
        alert_id: &AlertId,
        user_id: &UserId,
    ) -> Result<Option<Vote>, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let is_upvote: Option<bool> = alert_votes::table
            .filter(alert_votes::alert_id.eq(alert_id.as_uuid()))
            .filter(alert_votes::user_id.eq(user_id.as_uuid()))
            .select(alert_votes::is_upvote)
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| errors().diesel(err))?;

        Ok(is_upvote.map(|is_upvote| Vote {
            alert_id: *alert_id,
            user_id: *user_id,
            direction: VoteDirection::from_upvote(is_upvote),
        }))
    }

    async fn apply(
        &self,
        alert_id: &AlertId,
        user_id: &UserId,
        change: VoteChange,
    ) -> Result<AlertTally, VoteRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let alert_id = *alert_id.as_uuid();
        let user_id = *user_id.as_uuid();
        let (up_delta, down_delta) = change.counter_deltas();

        let row = conn
            .transaction::<_, VoteTxError, _>(|conn| {
                async move {
                    let locked: Option<String> = alerts::table
                        .find(alert_id)
                        .select(alerts::status)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(status) = locked else {
                        return Err(VoteTxError::Conflict("alert no longer exists"));
                    };
                    if change.needs_open_alert() && !accepts_votes(&status) {
                        return Err(VoteTxError::Conflict("alert no longer accepts votes"));
                    }

                    write_vote_row(conn, alert_id, user_id, change).await?;

                    let row = diesel::update(alerts::table.find(alert_id))
                        .set((
                            alerts::upvotes.eq(alerts::upvotes + up_delta),
                            alerts::downvotes.eq(alerts::downvotes + down_delta),
                        ))
                        .returning(AlertRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_tx_error)?;

        Ok(AlertTally {
            id: AlertId::from_uuid(row.id),
            upvotes: counter_from_db(row.upvotes),
            downvotes: counter_from_db(row.downvotes),
            is_verified: row.is_verified,
            status: AlertStatus::parse(&row.status).unwrap_or(AlertStatus::Active),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn zero_rows_is_a_lost_race() {
        let err = map_tx_error(ensure_one(0, "vote no longer present").expect_err("no rows"));
        assert_eq!(err, VoteRepositoryError::conflict("vote no longer present"));
    }

    #[rstest]
    #[case("ACTIVE", true)]
    #[case("VERIFIED", true)]
    #[case("REMOVED", false)]
    #[case("EXPIRED", false)]
    fn only_open_alerts_accept_votes(#[case] status: &str, #[case] expected: bool) {
        assert_eq!(accepts_votes(status), expected);
    }

    #[rstest]
    fn database_errors_keep_their_mapping() {
        let err = map_tx_error(VoteTxError::from(diesel::result::Error::NotFound));
        assert!(matches!(err, VoteRepositoryError::Query { .. }));
    }
}
