//! PostgreSQL-backed `SosRepository`.
//!
//! The partial unique index on `(user_id) WHERE status = 'ACTIVE'` enforces
//! one active request per user; its violation surfaces as a conflict.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{SosRepository, SosRepositoryError};
use crate::domain::sos::{SosRequest, SosStatus};
use crate::domain::{SosId, UserId};

use super::error_mapping::ErrorKinds;
use super::models::{NewSosRow, SosRow, SosTransitionChangeset};
use super::pool::DbPool;
use super::schema::sos_requests;

fn errors() -> ErrorKinds<SosRepositoryError> {
    ErrorKinds {
        query: SosRepositoryError::query,
        connection: SosRepositoryError::connection,
        conflict: Some(SosRepositoryError::conflict),
    }
}

fn to_domain(row: SosRow) -> Result<SosRequest, SosRepositoryError> {
    row.into_domain()
        .map_err(|_| SosRepositoryError::query("stored SOS request has invalid coordinates"))
}

#[derive(Clone)]
pub struct DieselSosRepository {
    pool: DbPool,
}

impl DieselSosRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SosRepository for DieselSosRepository {
    async fn insert(&self, request: &SosRequest) -> Result<(), SosRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        diesel::insert_into(sos_requests::table)
            .values(NewSosRow::from(request))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| errors().diesel(err))
    }

    async fn find_by_id(&self, id: &SosId) -> Result<Option<SosRequest>, SosRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let row = sos_requests::table
            .find(id.as_uuid())
            .select(SosRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| errors().diesel(err))?;
        row.map(to_domain).transpose()
    }

    async fn find_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SosRequest>, SosRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let row = sos_requests::table
            .filter(sos_requests::user_id.eq(user_id.as_uuid()))
            .filter(sos_requests::status.eq(SosStatus::Active.as_str()))
            .select(SosRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| errors().diesel(err))?;
        row.map(to_domain).transpose()
    }

    async fn list_active(&self) -> Result<Vec<SosRequest>, SosRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let rows: Vec<SosRow> = sos_requests::table
            .filter(sos_requests::status.eq(SosStatus::Active.as_str()))
            .order(sos_requests::created_at.desc())
            .select(SosRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| errors().diesel(err))?;
        rows.into_iter().map(to_domain).collect()
    }

    async fn save_transition(
        &self,
        request: &SosRequest,
        expected: SosStatus,
    ) -> Result<bool, SosRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let updated = diesel::update(
            sos_requests::table
                .filter(sos_requests::id.eq(request.id.as_uuid()))
                .filter(sos_requests::status.eq(expected.as_str())),
        )
        .set(SosTransitionChangeset {
            status: request.status.as_str(),
            responded_at: request.responded_at,
            resolved_at: request.resolved_at,
        })
        .execute(&mut conn)
        .await
        .map_err(|err| errors().diesel(err))?;
        Ok(updated > 0)
    }
}
