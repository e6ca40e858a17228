//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler plus the health probes, the
//! shared payload schemas, and the session cookie security scheme. The
//! document backs Swagger UI in debug builds and is exported by the
//! `openapi-dump` binary for client generation.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::admin::{BroadcastRequest, RemoveAlertRequest};
use crate::inbound::http::alerts::{
    AlertDetailResponse, AlertListResponse, CreateAlertRequest, ListedAlertItem, MessageResponse,
    NearbyAlertItem, OfflineAlertRequest, OfflineSyncRequest, OfflineSyncResponse,
    SkippedAlertItem, UpdateAlertRequest,
};
use crate::inbound::http::notifications::{InboxResponse, UnreadCountResponse};
use crate::inbound::http::sos::{CreateSosRequest, NearbySosItem, SosStatusRequest};
use crate::inbound::http::users::MyAlertsResponse;
use crate::inbound::http::votes::{CastVoteRequest, VoteResponse, VoteStatusResponse};
use crate::inbound::payloads::{
    AlertPayload, AlertTallyPayload, BroadcastPayload, ContributionPayload, LeaderboardEntryPayload,
    NotificationPayload, PaginationPayload, SosPayload,
};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by the authentication service; carries the user id and role.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "RoadGuard backend API",
        description = "Crowd-sourced road hazard alerts, community verification, SOS requests and admin broadcasts.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::alerts::create_alert,
        crate::inbound::http::alerts::list_alerts,
        crate::inbound::http::alerts::nearby_alerts,
        crate::inbound::http::alerts::alerts_in_area,
        crate::inbound::http::alerts::sync_offline_alerts,
        crate::inbound::http::alerts::get_alert,
        crate::inbound::http::alerts::update_alert,
        crate::inbound::http::alerts::delete_alert,
        crate::inbound::http::votes::cast_vote,
        crate::inbound::http::votes::remove_vote,
        crate::inbound::http::votes::vote_status,
        crate::inbound::http::admin::remove_alert,
        crate::inbound::http::admin::broadcast,
        crate::inbound::http::sos::create_sos,
        crate::inbound::http::sos::active_sos,
        crate::inbound::http::sos::nearby_sos,
        crate::inbound::http::sos::update_sos_status,
        crate::inbound::http::sos::cancel_sos,
        crate::inbound::http::users::my_contribution,
        crate::inbound::http::users::my_alerts,
        crate::inbound::http::users::leaderboard,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::unread_count,
        crate::inbound::http::notifications::mark_all_read,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::notifications::delete_notification,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        AlertPayload,
        AlertTallyPayload,
        AlertDetailResponse,
        NearbyAlertItem,
        ListedAlertItem,
        AlertListResponse,
        OfflineAlertRequest,
        OfflineSyncRequest,
        OfflineSyncResponse,
        SkippedAlertItem,
        PaginationPayload,
        CreateAlertRequest,
        UpdateAlertRequest,
        MessageResponse,
        CastVoteRequest,
        VoteResponse,
        VoteStatusResponse,
        RemoveAlertRequest,
        BroadcastRequest,
        BroadcastPayload,
        CreateSosRequest,
        SosStatusRequest,
        NearbySosItem,
        SosPayload,
        ContributionPayload,
        LeaderboardEntryPayload,
        MyAlertsResponse,
        NotificationPayload,
        InboxResponse,
        UnreadCountResponse,
    )),
    tags(
        (name = "alerts", description = "Hazard reports and nearby search"),
        (name = "votes", description = "Community verification"),
        (name = "sos", description = "Roadside help requests"),
        (name = "admin", description = "Moderation and broadcasts"),
        (name = "users", description = "Contribution standing and the leaderboard"),
        (name = "notifications", description = "Per-user notification inbox"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document's paths and schemas.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/alerts")]
    #[case("/api/v1/alerts/nearby")]
    #[case("/api/v1/alerts/area")]
    #[case("/api/v1/alerts/offline")]
    #[case("/api/v1/alerts/{id}")]
    #[case("/api/v1/alerts/{id}/vote")]
    #[case("/api/v1/alerts/{id}/vote/status")]
    #[case("/api/v1/admin/alerts/{id}/remove")]
    #[case("/api/v1/admin/broadcast")]
    #[case("/api/v1/sos")]
    #[case("/api/v1/sos/active")]
    #[case("/api/v1/sos/nearby")]
    #[case("/api/v1/sos/{id}/status")]
    #[case("/api/v1/sos/{id}/cancel")]
    #[case("/api/v1/users/me/contribution")]
    #[case("/api/v1/users/me/alerts")]
    #[case("/api/v1/users/leaderboard")]
    #[case("/api/v1/notifications")]
    #[case("/api/v1/notifications/unread-count")]
    #[case("/api/v1/notifications/read-all")]
    #[case("/api/v1/notifications/{id}/read")]
    #[case("/api/v1/notifications/{id}")]
    #[case("/health/ready")]
    #[case("/health/live")]
    fn documents_every_route(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[test]
    fn error_schema_has_code_and_message() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn alert_schema_uses_wire_names() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let alert_schema = schemas.get("AlertPayload").expect("AlertPayload schema");

        assert_object_schema_has_field(alert_schema, "type");
        assert_object_schema_has_field(alert_schema, "isVerified");
        assert_object_schema_has_field(alert_schema, "expiresAt");
    }

    #[test]
    fn notification_schema_uses_wire_names() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas
            .get("NotificationPayload")
            .expect("NotificationPayload schema");

        assert_object_schema_has_field(schema, "type");
        assert_object_schema_has_field(schema, "isRead");
        assert_object_schema_has_field(schema, "createdAt");
    }

    #[test]
    fn registers_the_session_cookie_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
