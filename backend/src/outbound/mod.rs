//! Outbound adapters implementing the domain ports.
//!
//! - **persistence**: PostgreSQL repositories via Diesel
//! - **memory**: process-local repositories for database-less runs and tests
//! - **realtime**: grid-cell WebSocket fan-out behind `AlertEventPublisher`
//!
//! Adapters translate; they hold no business rules.

pub mod memory;
pub mod persistence;
pub mod realtime;
