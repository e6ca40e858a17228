//! Structured `invalid_request` errors for domain validation failures.

use serde_json::json;

use super::Error;
use super::alert::FieldTooLong;

impl From<FieldTooLong> for Error {
    fn from(error: FieldTooLong) -> Self {
        Error::invalid_request(error.to_string()).with_details(json!({
            "field": error.field,
            "max": error.max,
            "code": "too_long",
        }))
    }
}
