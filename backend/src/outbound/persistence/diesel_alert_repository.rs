//! PostgreSQL-backed `AlertRepository`.
//!
//! Status guards live in the `WHERE` clauses, so concurrent removals,
//! verifications and sweeps each take effect at most once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::alert::{Alert, AlertEdit, AlertFilter, AlertRemoval, AlertStatus};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::ports::{AlertRepository, AlertRepositoryError};
use crate::domain::{AlertId, ContributionChange, UserId};

use super::contribution_updates::apply_contribution;
use super::error_mapping::ErrorKinds;
use super::models::{AlertEditChangeset, AlertRow, NewAlertRow};
use super::pool::DbPool;
use super::schema::alerts;

const OPEN_STATUSES: [&str; 3] = ["ACTIVE", "PENDING", "VERIFIED"];
const UNVERIFIED_STATUSES: [&str; 2] = ["ACTIVE", "PENDING"];

fn errors() -> ErrorKinds<AlertRepositoryError> {
    ErrorKinds {
        query: AlertRepositoryError::query,
        connection: AlertRepositoryError::connection,
        conflict: None,
    }
}

fn to_domain(row: AlertRow) -> Result<Alert, AlertRepositoryError> {
    let id = row.id;
    row.into_domain().map_err(|err| {
        tracing::warn!(alert_id = %id, error = %err, "stored alert has invalid coordinates");
        AlertRepositoryError::query("stored alert has invalid coordinates")
    })
}

fn to_domain_opt(row: Option<AlertRow>) -> Result<Option<Alert>, AlertRepositoryError> {
    row.map(to_domain).transpose()
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards in it escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn matching(filter: &AlertFilter, now: DateTime<Utc>) -> alerts::BoxedQuery<'static, Pg> {
    let mut query = alerts::table.filter(alerts::expires_at.gt(now)).into_boxed();
    if let Some(kind) = filter.kind {
        query = query.filter(alerts::alert_type.eq(kind.as_str()));
    }
    if let Some(severity) = filter.severity {
        query = query.filter(alerts::severity.eq(severity.as_str()));
    }
    if let Some(status) = filter.status {
        query = query.filter(alerts::status.eq(status.as_str()));
    }
    if filter.verified_only {
        query = query.filter(alerts::is_verified.eq(true));
    }
    if let Some(area) = filter.area.as_deref() {
        query = query.filter(alerts::area.ilike(contains_pattern(area)));
    }
    if let Some(road_name) = filter.road_name.as_deref() {
        query = query.filter(alerts::road_name.ilike(contains_pattern(road_name)));
    }
    query
}

fn reported_by(reporter: &UserId, status: Option<AlertStatus>) -> alerts::BoxedQuery<'static, Pg> {
    let mut query = alerts::table
        .filter(alerts::reporter_id.eq(*reporter.as_uuid()))
        .into_boxed();
    if let Some(status) = status {
        query = query.filter(alerts::status.eq(status.as_str()));
    }
    query
}

#[derive(Clone)]
pub struct DieselAlertRepository {
    pool: DbPool,
}

impl DieselAlertRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertRepository for DieselAlertRepository {
    async fn insert_reported(
        &self,
        alert: &Alert,
        credit: &ContributionChange,
    ) -> Result<(), AlertRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let row = NewAlertRow::from(alert);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(alerts::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                apply_contribution(conn, credit).await
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| errors().diesel(err))
    }

    async fn insert_reported_batch(
        &self,
        batch: &[Alert],
        credit: &ContributionChange,
    ) -> Result<(), AlertRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let rows: Vec<NewAlertRow<'_>> = batch.iter().map(NewAlertRow::from).collect();

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                if !rows.is_empty() {
                    diesel::insert_into(alerts::table)
                        .values(&rows)
                        .execute(conn)
                        .await?;
                }
                apply_contribution(conn, credit).await
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| errors().diesel(err))
    }

    async fn find_by_id(&self, id: &AlertId) -> Result<Option<Alert>, AlertRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let row = alerts::table
            .find(id.as_uuid())
            .select(AlertRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| errors().diesel(err))?;
        to_domain_opt(row)
    }

    async fn list_live(&self, now: DateTime<Utc>) -> Result<Vec<Alert>, AlertRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let rows: Vec<AlertRow> = alerts::table
            .filter(alerts::status.eq(AlertStatus::Active.as_str()))
            .filter(alerts::expires_at.gt(now))
            .order(alerts::created_at.desc())
            .select(AlertRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| errors().diesel(err))?;
        rows.into_iter().map(to_domain).collect()
    }

    async fn list_matching(
        &self,
        filter: &AlertFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Alert>, AlertRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let rows: Vec<AlertRow> = matching(filter, now)
            .select(AlertRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| errors().diesel(err))?;
        rows.into_iter().map(to_domain).collect()
    }

    async fn list_by_reporter(
        &self,
        reporter: &UserId,
        status: Option<AlertStatus>,
        page: PageRequest,
    ) -> Result<Page<Alert>, AlertRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let total: i64 = reported_by(reporter, status)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|err| errors().diesel(err))?;
        let rows: Vec<AlertRow> = reported_by(reporter, status)
            .order((alerts::created_at.desc(), alerts::id.desc()))
            .limit(i64::from(page.limit()))
            .offset(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .select(AlertRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| errors().diesel(err))?;
        let items = rows.into_iter().map(to_domain).collect::<Result<_, _>>()?;
        Ok(Page::new(
            items,
            page,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    async fn apply_edit(
        &self,
        id: &AlertId,
        edit: &AlertEdit,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let target = alerts::table
            .filter(alerts::id.eq(id.as_uuid()))
            .filter(alerts::status.eq_any(OPEN_STATUSES));

        // An empty changeset is rejected by Diesel; read the row instead.
        let result = if edit.is_empty() {
            target
                .select(AlertRow::as_select())
                .first(&mut conn)
                .await
                .optional()
        } else {
            diesel::update(target)
                .set(AlertEditChangeset::from(edit))
                .returning(AlertRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
        };
        to_domain_opt(result.map_err(|err| errors().diesel(err))?)
    }

    async fn remove(
        &self,
        id: &AlertId,
        removal: &AlertRemoval,
        penalty: &ContributionChange,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let id = *id.as_uuid();

        let row = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let removed = diesel::update(
                        alerts::table
                            .filter(alerts::id.eq(id))
                            .filter(alerts::status.eq_any(OPEN_STATUSES)),
                    )
                    .set((
                        alerts::status.eq(AlertStatus::Removed.as_str()),
                        alerts::removed_at.eq(removal.removed_at),
                        alerts::remove_reason.eq(removal.reason.as_deref()),
                    ))
                    .returning(AlertRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                    let Some(removed) = removed else {
                        return Ok(None);
                    };
                    apply_contribution(conn, penalty).await?;
                    if removal.edit.is_empty() {
                        return Ok(Some(removed));
                    }
                    let edited = diesel::update(alerts::table.find(id))
                        .set(AlertEditChangeset::from(&removal.edit))
                        .returning(AlertRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(Some(edited))
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| errors().diesel(err))?;
        to_domain_opt(row)
    }

    async fn mark_verified(
        &self,
        id: &AlertId,
        verified_at: DateTime<Utc>,
        reward: &ContributionChange,
    ) -> Result<Option<Alert>, AlertRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let id = *id.as_uuid();

        let row = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let verified = diesel::update(
                        alerts::table
                            .filter(alerts::id.eq(id))
                            .filter(alerts::is_verified.eq(false))
                            .filter(alerts::status.eq_any(UNVERIFIED_STATUSES)),
                    )
                    .set((
                        alerts::is_verified.eq(true),
                        alerts::status.eq(AlertStatus::Verified.as_str()),
                        alerts::verified_at.eq(verified_at),
                    ))
                    .returning(AlertRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                    if verified.is_some() {
                        apply_contribution(conn, reward).await?;
                    }
                    Ok(verified)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| errors().diesel(err))?;
        to_domain_opt(row)
    }

    async fn delete(&self, id: &AlertId) -> Result<bool, AlertRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let deleted = diesel::delete(alerts::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(|err| errors().diesel(err))?;
        Ok(deleted > 0)
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<AlertId>, AlertRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| errors().pool(err))?;
        let mut expired: Vec<(uuid::Uuid, DateTime<Utc>)> = diesel::update(
            alerts::table
                .filter(alerts::status.eq_any(AlertStatus::EXPIRABLE.map(|s| s.as_str())))
                .filter(alerts::expires_at.le(now)),
        )
        .set(alerts::status.eq(AlertStatus::Expired.as_str()))
        .returning((alerts::id, alerts::expires_at))
        .get_results(&mut conn)
        .await
        .map_err(|err| errors().diesel(err))?;

        expired.sort_by_key(|(_, expires_at)| *expires_at);
        Ok(expired
            .into_iter()
            .map(|(id, _)| AlertId::from_uuid(id))
            .collect())
    }
}
