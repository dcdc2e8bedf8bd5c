pub(crate) mod forecast;
pub(crate) mod sensor_data;
pub(crate) mod sensor_permission;
