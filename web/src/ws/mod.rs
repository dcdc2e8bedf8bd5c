//! WebSocket endpoint for live sensor events.
//!
//! The registry, relay and event queue live in the `relay` and `events` crates;
//! this module only adapts an axum WebSocket to the relay's `Transport`.

pub(crate) mod handler;
pub(crate) mod transport;
