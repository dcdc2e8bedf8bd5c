pub(crate) mod forecast_controller;
pub(crate) mod health_check_controller;
pub(crate) mod sensor_controller;
pub(crate) mod sensor_data_controller;
pub(crate) mod sensor_permission_controller;
pub(crate) mod user_controller;
pub(crate) mod user_session_controller;
