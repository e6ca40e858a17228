//! Diesel table definitions mirroring `migrations/`.
//!
//! Keep in step with the SQL; `diesel print-schema` against a migrated
//! database regenerates the same shapes.

diesel::table! {
    /// Reported road hazards.
    alerts (id) {
        id -> Uuid,
        /// One of the `AlertType` wire names.
        alert_type -> Varchar,
        severity -> Varchar,
        latitude -> Float8,
        longitude -> Float8,
        title -> Nullable<Varchar>,
        description -> Nullable<Varchar>,
        address -> Nullable<Varchar>,
        road_name -> Nullable<Varchar>,
        area -> Nullable<Varchar>,
        reporter_id -> Uuid,
        status -> Varchar,
        /// Always equal to the number of `alert_votes` rows with `is_upvote`.
        upvotes -> Int4,
        downvotes -> Int4,
        is_verified -> Bool,
        created_at -> Timestamptz,
        expires_at -> Timestamptz,
        verified_at -> Nullable<Timestamptz>,
        removed_at -> Nullable<Timestamptz>,
        remove_reason -> Nullable<Text>,
    }
}

diesel::table! {
    /// One row per `(alert_id, user_id)`; cascades with the alert.
    alert_votes (alert_id, user_id) {
        alert_id -> Uuid,
        user_id -> Uuid,
        is_upvote -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user contribution projection.
    contributors (user_id) {
        user_id -> Uuid,
        contribution_score -> Int4,
        level -> Varchar,
        total_reports -> Int4,
        verified_reports -> Int4,
    }
}

diesel::table! {
    /// Roadside help requests. A partial unique index allows one `ACTIVE`
    /// row per user.
    sos_requests (id) {
        id -> Uuid,
        user_id -> Uuid,
        sos_type -> Varchar,
        description -> Nullable<Varchar>,
        address -> Nullable<Varchar>,
        latitude -> Float8,
        longitude -> Float8,
        status -> Varchar,
        created_at -> Timestamptz,
        responded_at -> Nullable<Timestamptz>,
        resolved_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Per-user inbox, newest first by `created_at`.
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        /// `SYSTEM` or the broadcast's type label.
        kind -> Varchar,
        title -> Varchar,
        message -> Text,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(alert_votes -> alerts (alert_id));

diesel::allow_tables_to_appear_in_same_query!(
    alerts,
    alert_votes,
    contributors,
    notifications,
    sos_requests,
);
