use domain::Id;
use serde::Deserialize;
use utoipa::IntoParams;

/// Identifies one grant by the user and sensor it links.
#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct PermissionParams {
    #[param(value_type = String, format = Uuid)]
    pub(crate) user_id: Id,
    #[param(value_type = String, format = Uuid)]
    pub(crate) sensor_id: Id,
}
