//! Live push infrastructure for sensor events.
//!
//! # Architecture
//!
//! - **Single connection per user**: each authenticated user holds at most one
//!   live connection. A second connection attempt is refused and left for the
//!   caller to close; the existing connection is never replaced.
//! - **Snapshot fan-out**: the relay copies the registry before delivering an
//!   event, so registrations and disconnects can happen while a delivery is in
//!   flight. Connections that disappear mid-delivery are skipped.
//! - **Per-recipient authorization**: every recipient is checked against the
//!   event's resource through a [`events::PermissionCheck`]. Denials and check
//!   failures are silent; the client simply never sees the event.
//! - **Ephemeral messages**: offline users miss events. Nothing is stored or replayed.
//!
//! # Message Flow
//!
//! 1. A client opens the `/ws` WebSocket; the web layer registers the socket's
//!    sink as a [`connection::Transport`] in the [`ConnectionRegistry`]
//! 2. Sensor data ingestion publishes a [`events::DomainEvent`] to the queue
//! 3. The background task started with [`relay::spawn`] takes one event at a
//!    time and hands it to [`Relay::deliver`]
//! 4. Each authorized, still-registered connection receives the event payload as JSON text
//! 5. When the socket closes, the web layer unregisters the connection
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry, Connection and the Transport trait
//! - `relay`: the permission-filtered fan-out and its background loop

pub mod connection;
pub mod relay;

pub use connection::{ConnectionRegistry, Transport, TransportError};
pub use relay::Relay;
