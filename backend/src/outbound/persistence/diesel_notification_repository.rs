//! PostgreSQL-backed `NotificationRepository`.
//!
//! Every statement is scoped by `user_id`, so a user can never read or
//! change another user's rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::notification::{Notification, NotificationTemplate};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{NotificationId, UserId};

use super::error_mapping::ErrorKinds;
use super::models::{NewNotificationRow, NotificationRow};
use super::pool::DbPool;
use super::schema::{contributors, notifications};

/// Rows per `INSERT` when fanning out; stays well under the bind limit.
const FAN_OUT_CHUNK: usize = 1_000;

fn errors() -> ErrorKinds<NotificationRepositoryError> {
    ErrorKinds {
        query: NotificationRepositoryError::query,
        connection: NotificationRepositoryError::connection,
        conflict: None,
    }
}

fn inbox(user_id: &UserId, unread_only: bool) -> notifications::BoxedQuery<'static, Pg> {
    let mut query = notifications::table
        .filter(notifications::user_id.eq(*user_id.as_uuid()))
        .into_boxed();
    if unread_only {
        query = query.filter(notifications::is_read.eq(false));
    }
    query
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn fan_out(
        &self,
        template: &NotificationTemplate,
        now: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let recipients: Vec<Uuid> = contributors::table
                    .select(contributors::user_id)
                    .load(conn)
                    .await?;
                let notes: Vec<Notification> = recipients
                    .into_iter()
                    .map(|user_id| template.for_user(UserId::from_uuid(user_id), now))
                    .collect();
                for chunk in notes.chunks(FAN_OUT_CHUNK) {
                    let rows: Vec<NewNotificationRow<'_>> =
                        chunk.iter().map(NewNotificationRow::from).collect();
                    diesel::insert_into(notifications::table)
                        .values(&rows)
                        .execute(conn)
                        .await?;
                }
                Ok(notes.len() as u64)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| errors().diesel(err))
    }

    async fn list(
        &self,
        user_id: &UserId,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let total: i64 = inbox(user_id, unread_only)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| errors().diesel(err))?;
        let rows: Vec<NotificationRow> = inbox(user_id, unread_only)
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .limit(i64::from(page.limit()))
            .offset(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .select(NotificationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| errors().diesel(err))?;
        Ok(Page::new(
            rows.into_iter().map(Notification::from).collect(),
            page,
            count(total),
        ))
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let unread: i64 = inbox(user_id, true)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| errors().diesel(err))?;
        Ok(count(unread))
    }

    async fn mark_read(
        &self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let row = diesel::update(
            notifications::table
                .filter(notifications::id.eq(*id.as_uuid()))
                .filter(notifications::user_id.eq(*user_id.as_uuid())),
        )
        .set(notifications::is_read.eq(true))
        .returning(NotificationRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(|err| errors().diesel(err))?;
        Ok(row.map(Notification::from))
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let changed = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(*user_id.as_uuid()))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(|err| errors().diesel(err))?;
        Ok(changed as u64)
    }

    async fn delete(
        &self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Result<bool, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let deleted = diesel::delete(
            notifications::table
                .filter(notifications::id.eq(*id.as_uuid()))
                .filter(notifications::user_id.eq(*user_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(|err| errors().diesel(err))?;
        Ok(deleted > 0)
    }
}
