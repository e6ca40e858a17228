//! Mapping from driven-port failures to domain [`Error`] codes.
//!
//! Connection failures surface as `service_unavailable`; query failures as
//! `internal_error` (redacted at the HTTP edge).

use super::Error;
use super::ports::{
    AlertRepositoryError, ContributorRepositoryError, NotificationRepositoryError,
    SosRepositoryError, VoteRepositoryError,
};

impl From<AlertRepositoryError> for Error {
    fn from(error: AlertRepositoryError) -> Self {
        match error {
            AlertRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("alert repository unavailable: {message}"))
            }
            AlertRepositoryError::Query { message } => {
                Error::internal(format!("alert repository error: {message}"))
            }
        }
    }
}

impl From<VoteRepositoryError> for Error {
    fn from(error: VoteRepositoryError) -> Self {
        match error {
            VoteRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("vote repository unavailable: {message}"))
            }
            VoteRepositoryError::Query { message } => {
                Error::internal(format!("vote repository error: {message}"))
            }
            VoteRepositoryError::Conflict { message } => Error::conflict(message),
        }
    }
}

impl From<ContributorRepositoryError> for Error {
    fn from(error: ContributorRepositoryError) -> Self {
        match error {
            ContributorRepositoryError::Connection { message } => Error::service_unavailable(
                format!("contributor repository unavailable: {message}"),
            ),
            ContributorRepositoryError::Query { message } => {
                Error::internal(format!("contributor repository error: {message}"))
            }
        }
    }
}

impl From<NotificationRepositoryError> for Error {
    fn from(error: NotificationRepositoryError) -> Self {
        match error {
            NotificationRepositoryError::Connection { message } => Error::service_unavailable(
                format!("notification repository unavailable: {message}"),
            ),
            NotificationRepositoryError::Query { message } => {
                Error::internal(format!("notification repository error: {message}"))
            }
        }
    }
}

impl From<SosRepositoryError> for Error {
    fn from(error: SosRepositoryError) -> Self {
        match error {
            SosRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("sos repository unavailable: {message}"))
            }
            SosRepositoryError::Query { message } => {
                Error::internal(format!("sos repository error: {message}"))
            }
            SosRepositoryError::Conflict { message } => Error::conflict(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(AlertRepositoryError::connection("refused").into(), ErrorCode::ServiceUnavailable)]
    #[case(AlertRepositoryError::query("syntax").into(), ErrorCode::InternalError)]
    #[case(VoteRepositoryError::conflict("duplicate").into(), ErrorCode::Conflict)]
    #[case(SosRepositoryError::conflict("active").into(), ErrorCode::Conflict)]
    #[case(ContributorRepositoryError::connection("timeout").into(), ErrorCode::ServiceUnavailable)]
    #[case(NotificationRepositoryError::query("bad column").into(), ErrorCode::InternalError)]
    fn maps_port_failures(#[case] error: Error, #[case] expected: ErrorCode) {
        assert_eq!(error.code(), expected);
    }
}
