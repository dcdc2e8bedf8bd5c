//! Business logic of the weather station: cached forecasts, bearer token
//! authentication, sensors with their per-user permissions and sensor reading
//! ingestion.
//!
//! Entity types are re-exported so the web layer never depends on `entity_api` directly.

pub use entity_api::{sensor_data, sensor_permissions, sensor_type, sensors, users, Id};

pub mod error;
pub mod forecast;
pub mod forecast_cache;
pub mod gateway;
pub mod jwt;
pub mod sensor;
pub mod sensor_datum;
pub mod sensor_permission;
pub mod user;
