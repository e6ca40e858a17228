//! Diesel and pool failures translated into repository port errors.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Constructors of one port's error enum.
///
/// `conflict` is `None` for ports without a conflict variant; unique
/// violations then surface as query errors.
pub(crate) struct ErrorKinds<E> {
    pub query: fn(&'static str) -> E,
    pub connection: fn(String) -> E,
    pub conflict: Option<fn(&'static str) -> E>,
}

impl<E> ErrorKinds<E> {
    pub fn pool(&self, error: PoolError) -> E {
        (self.connection)(error.into_message())
    }

    pub fn diesel(&self, error: DieselError) -> E {
        match &error {
            DieselError::DatabaseError(kind, info) => {
                debug!(?kind, message = info.message(), "diesel operation failed");
            }
            _ => debug!(
                error_type = %std::any::type_name_of_val(&error),
                "diesel operation failed"
            ),
        }

        match error {
            DieselError::NotFound => (self.query)("record not found"),
            DieselError::QueryBuilderError(_) => (self.query)("database query error"),
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
                (self.connection)("database connection error".to_owned())
            }
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => self
                .conflict
                .map_or_else(|| (self.query)("database error"), |conflict| conflict("duplicate record")),
            _ => (self.query)("database error"),
        }
    }
}
