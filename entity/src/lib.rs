use uuid::Uuid;

pub mod sensor_data;
pub mod sensor_permissions;
pub mod sensor_type;
pub mod sensors;
pub mod users;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
