//! Request-field parsing shared by the HTTP handlers and the WebSocket
//! session.
//!
//! Every failure is an `invalid_request` error whose details name the
//! offending field (camelCase), a machine-readable code and, where useful,
//! the rejected value.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::domain::alert::{AlertStatus, AlertType, Severity};
use crate::domain::geo::{CoordinateError, Coordinates, SearchRadius};
use crate::domain::pagination::{MAX_PAGE_LIMIT, PageRequest};
use crate::domain::sos::{SosKind, SosStatus};
use crate::domain::{AlertId, Error, NotificationId, SosId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    OutOfRange,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::OutOfRange => "out_of_range",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Wire name of a request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(&self) -> &'static str {
        self.0
    }
}

pub(crate) const LATITUDE: FieldName = FieldName::new("latitude");
pub(crate) const LONGITUDE: FieldName = FieldName::new("longitude");
pub(crate) const RADIUS: FieldName = FieldName::new("radius");
pub(crate) const PAGE: FieldName = FieldName::new("page");
pub(crate) const LIMIT: FieldName = FieldName::new("limit");

fn field_error(field: FieldName, code: ErrorCode, message: String, value: Option<Value>) -> Error {
    let mut details = json!({
        "field": field.as_str(),
        "code": code.as_str(),
    });
    if let (Some(value), Some(map)) = (value, details.as_object_mut()) {
        map.insert("value".to_owned(), value);
    }
    Error::invalid_request(message).with_details(details)
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    field_error(
        field,
        ErrorCode::MissingField,
        format!("missing required field: {}", field.as_str()),
        None,
    )
}

pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        field_error(
            field,
            ErrorCode::InvalidUuid,
            format!("{} must be a valid UUID", field.as_str()),
            Some(json!(value)),
        )
    })
}

pub(crate) fn parse_alert_id(value: &str) -> Result<AlertId, Error> {
    parse_uuid(value, FieldName::new("id")).map(AlertId::from_uuid)
}

pub(crate) fn parse_sos_id(value: &str) -> Result<SosId, Error> {
    parse_uuid(value, FieldName::new("id")).map(SosId::from_uuid)
}

pub(crate) fn parse_notification_id(value: &str) -> Result<NotificationId, Error> {
    parse_uuid(value, FieldName::new("id")).map(NotificationId::from_uuid)
}

/// Page number (default 1) and page size (default `default_limit`).
pub(crate) fn parse_page(
    page: Option<u32>,
    limit: Option<u32>,
    default_limit: u32,
) -> Result<PageRequest, Error> {
    let page = page.unwrap_or(1);
    if page == 0 {
        return Err(field_error(
            PAGE,
            ErrorCode::OutOfRange,
            "page must be at least 1".to_owned(),
            Some(json!(page)),
        ));
    }
    let limit = parse_limit(limit, default_limit)?;
    PageRequest::new(page, limit)
}

/// Page size between 1 and [`MAX_PAGE_LIMIT`], falling back to `default`.
pub(crate) fn parse_limit(limit: Option<u32>, default: u32) -> Result<u32, Error> {
    let limit = limit.unwrap_or(default);
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(field_error(
            LIMIT,
            ErrorCode::OutOfRange,
            format!("limit must be between 1 and {MAX_PAGE_LIMIT}"),
            Some(json!(limit)),
        ));
    }
    Ok(limit)
}

/// RFC 3339 timestamp.
pub(crate) fn parse_timestamp(value: &str, field: FieldName) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| {
            field_error(
                field,
                ErrorCode::InvalidValue,
                format!("{} must be an RFC 3339 timestamp", field.as_str()),
                Some(json!(value)),
            )
        })
}

/// Validate a latitude/longitude pair, naming whichever field is at fault.
pub(crate) fn parse_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Coordinates, Error> {
    let latitude = require(latitude, LATITUDE)?;
    let longitude = require(longitude, LONGITUDE)?;
    Coordinates::new(latitude, longitude).map_err(|err| {
        let (field, value) = match err {
            CoordinateError::LongitudeOutOfRange(_) => (LONGITUDE, longitude),
            CoordinateError::NotFinite if latitude.is_finite() => (LONGITUDE, longitude),
            CoordinateError::NotFinite | CoordinateError::LatitudeOutOfRange(_) => {
                (LATITUDE, latitude)
            }
        };
        field_error(field, ErrorCode::OutOfRange, err.to_string(), Some(json!(value)))
    })
}

/// Optional radius in metres, falling back to `default`.
pub(crate) fn parse_radius(value: Option<f64>, default: SearchRadius) -> Result<SearchRadius, Error> {
    match value {
        None => Ok(default),
        Some(metres) => SearchRadius::new(metres).ok_or_else(|| {
            field_error(
                RADIUS,
                ErrorCode::OutOfRange,
                "radius must be a positive number of metres".to_owned(),
                Some(json!(metres)),
            )
        }),
    }
}

fn invalid_choice(field: FieldName, value: &str, allowed: &[&str]) -> Error {
    field_error(
        field,
        ErrorCode::InvalidValue,
        format!("{} must be one of: {}", field.as_str(), allowed.join(", ")),
        Some(json!(value)),
    )
}

pub(crate) fn parse_alert_type(value: &str) -> Result<AlertType, Error> {
    AlertType::parse(value).ok_or_else(|| {
        let allowed = AlertType::ALL.map(|kind| kind.as_str());
        invalid_choice(FieldName::new("type"), value, &allowed)
    })
}

pub(crate) fn parse_severity(value: &str) -> Result<Severity, Error> {
    Severity::parse(value).ok_or_else(|| {
        invalid_choice(
            FieldName::new("severity"),
            value,
            &["LOW", "MEDIUM", "HIGH", "CRITICAL"],
        )
    })
}

pub(crate) fn parse_alert_status(value: &str) -> Result<AlertStatus, Error> {
    AlertStatus::parse(value).ok_or_else(|| {
        invalid_choice(
            FieldName::new("status"),
            value,
            &["ACTIVE", "PENDING", "VERIFIED", "REMOVED", "EXPIRED"],
        )
    })
}

pub(crate) fn parse_sos_kind(value: &str) -> Result<SosKind, Error> {
    SosKind::parse(value).ok_or_else(|| {
        invalid_choice(
            FieldName::new("type"),
            value,
            &["MEDICAL", "ACCIDENT", "BREAKDOWN", "FUEL", "SECURITY", "OTHER"],
        )
    })
}

pub(crate) fn parse_sos_status(value: &str) -> Result<SosStatus, Error> {
    SosStatus::parse(value).ok_or_else(|| {
        invalid_choice(
            FieldName::new("status"),
            value,
            &["ACTIVE", "RESPONDED", "RESOLVED", "CANCELLED"],
        )
    })
}
