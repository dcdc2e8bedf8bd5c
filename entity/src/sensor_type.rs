use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a sensor reports. Only environmental sensors take temperature,
/// humidity and pressure readings.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    EnumIter,
    Deserialize,
    Default,
    Serialize,
    DeriveActiveEnum,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[schema(as = entity::sensor_type::SensorType)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "sensor_type")]
pub enum SensorType {
    #[sea_orm(string_value = "environmental")]
    #[default]
    Environmental,
    #[sea_orm(string_value = "state")]
    State,
}

impl std::fmt::Display for SensorType {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorType::Environmental => write!(fmt, "environmental"),
            SensorType::State => write!(fmt, "state"),
        }
    }
}
