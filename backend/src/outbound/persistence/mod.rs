//! PostgreSQL adapters for the repository ports, built on Diesel.
//!
//! Row structs and table definitions stay private to this module; the
//! repositories translate at the boundary and map every database failure to
//! the port's error type.
//!
//! ```ignore
//! use roadguard::outbound::persistence::{DbPool, DieselAlertRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/roadguard")).await?;
//! let alerts = DieselAlertRepository::new(pool);
//! ```

mod contribution_updates;
mod diesel_alert_repository;
mod diesel_contributor_repository;
mod diesel_notification_repository;
mod diesel_sos_repository;
mod diesel_vote_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_alert_repository::DieselAlertRepository;
pub use diesel_contributor_repository::DieselContributorRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_sos_repository::DieselSosRepository;
pub use diesel_vote_repository::DieselVoteRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
