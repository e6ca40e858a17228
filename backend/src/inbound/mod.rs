//! Inbound adapters translating HTTP requests and WebSocket frames into
//! domain port calls.

pub mod http;
pub mod payloads;
pub mod ws;
