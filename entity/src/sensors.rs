use crate::sensor_type::SensorType;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::sensors::Model)]
#[sea_orm(schema_name = "weather_station", table_name = "sensors")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,
    #[sea_orm(unique)]
    pub name: String,
    #[serde(rename = "type")]
    #[sea_orm(column_name = "type")]
    pub sensor_type: SensorType,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sensor_data::Entity")]
    SensorData,
    #[sea_orm(has_many = "super::sensor_permissions::Entity")]
    SensorPermissions,
}

impl Related<super::sensor_data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SensorData.def()
    }
}

impl Related<super::sensor_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SensorPermissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
