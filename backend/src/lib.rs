//! RoadGuard backend library: domain core, HTTP and WebSocket adapters,
//! persistence, and real-time fan-out.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
