//! PostgreSQL-backed `ContributorRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ContributorRepository, ContributorRepositoryError};
use crate::domain::{ContributorStats, UserId};

use super::error_mapping::ErrorKinds;
use super::models::ContributorRow;
use super::pool::DbPool;
use super::schema::contributors;

fn errors() -> ErrorKinds<ContributorRepositoryError> {
    ErrorKinds {
        query: ContributorRepositoryError::query,
        connection: ContributorRepositoryError::connection,
        conflict: None,
    }
}

#[derive(Clone)]
pub struct DieselContributorRepository {
    pool: DbPool,
}

impl DieselContributorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContributorRepository for DieselContributorRepository {
    async fn find_stats(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ContributorStats>, ContributorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let row = contributors::table
            .find(user_id.as_uuid())
            .select(ContributorRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| errors().diesel(err))?;
        Ok(row.map(ContributorStats::from))
    }

    async fn top_by_score(
        &self,
        limit: u32,
    ) -> Result<Vec<ContributorStats>, ContributorRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let rows: Vec<ContributorRow> = contributors::table
            .order((
                contributors::contribution_score.desc(),
                contributors::verified_reports.desc(),
                contributors::user_id.asc(),
            ))
            .limit(i64::from(limit))
            .select(ContributorRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| errors().diesel(err))?;
        Ok(rows.into_iter().map(ContributorStats::from).collect())
    }
}
