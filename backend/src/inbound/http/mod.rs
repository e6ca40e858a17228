//! HTTP inbound adapter exposing REST endpoints.

pub mod admin;
pub mod alerts;
pub mod error;
pub mod health;
pub mod notifications;
pub mod session;
pub mod session_config;
pub mod sos;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;
pub mod votes;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` handler on `cfg`.
///
/// Literal segments are registered before `{id}` captures so that
/// `/alerts/nearby` never parses as an alert id.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(alerts::list_alerts)
        .service(alerts::nearby_alerts)
        .service(alerts::alerts_in_area)
        .service(alerts::sync_offline_alerts)
        .service(alerts::create_alert)
        .service(alerts::get_alert)
        .service(alerts::update_alert)
        .service(alerts::delete_alert)
        .service(votes::cast_vote)
        .service(votes::remove_vote)
        .service(votes::vote_status)
        .service(admin::remove_alert)
        .service(admin::broadcast)
        .service(sos::active_sos)
        .service(sos::nearby_sos)
        .service(sos::create_sos)
        .service(sos::update_sos_status)
        .service(sos::cancel_sos)
        .service(users::my_contribution)
        .service(users::my_alerts)
        .service(users::leaderboard)
        .service(notifications::list_notifications)
        .service(notifications::unread_count)
        .service(notifications::mark_all_read)
        .service(notifications::mark_read)
        .service(notifications::delete_notification);
}
