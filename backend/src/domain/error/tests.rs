//! Error construction and serialisation.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(Error::invalid_request("x"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("x"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("x"), ErrorCode::Forbidden)]
#[case(Error::not_found("x"), ErrorCode::NotFound)]
#[case(Error::conflict("x"), ErrorCode::Conflict)]
#[case(Error::service_unavailable("x"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("x"), ErrorCode::InternalError)]
fn constructors_set_matching_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[test]
fn trace_id_is_absent_outside_a_request() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[tokio::test]
async fn trace_id_is_captured_inside_a_scope() {
    let trace_id: TraceId = "11111111-2222-3333-4444-555555555555"
        .parse()
        .expect("valid uuid");
    let error = TraceId::scope(trace_id, async { Error::conflict("taken") }).await;
    assert_eq!(
        error.trace_id(),
        Some("11111111-2222-3333-4444-555555555555")
    );
}

#[test]
fn serialises_with_snake_case_code_and_omits_empty_fields() {
    let value = serde_json::to_value(Error::not_found("alert not found")).expect("serialise");
    assert_eq!(
        value,
        json!({"code": "not_found", "message": "alert not found"})
    );
}

#[test]
fn details_survive_serialisation() {
    let error = Error::invalid_request("bad latitude")
        .with_details(json!({"field": "latitude", "code": "out_of_range"}))
        .with_trace_id("abc");
    let value = serde_json::to_value(&error).expect("serialise");
    assert_eq!(value["traceId"], "abc");
    assert_eq!(value["details"]["field"], "latitude");
}
