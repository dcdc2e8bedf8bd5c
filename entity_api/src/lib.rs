pub use entity::{sensor_data, sensor_permissions, sensor_type, sensors, users, Id};

pub mod error;
pub mod sensor;
pub mod sensor_datum;
pub mod sensor_permission;
pub mod user;
