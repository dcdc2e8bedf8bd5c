//! Sensor registration and the per-user sensor listing.

use crate::error::{EntityErrorKind, Error};
use crate::sensor_permission::require_superuser;
use crate::{sensor_type::SensorType, sensors, Id};
use events::Identity;
use log::*;
use sea_orm::ConnectionTrait;
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

pub use entity_api::sensor::find_by_id;

/// A sensor together with the access the requesting user holds on it.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[schema(as = domain::sensor::UserSensor)]
pub struct UserSensor {
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    #[schema(value_type = String, format = Uuid)]
    pub user_id: Id,
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    pub read: bool,
    pub write: bool,
}

pub async fn create(
    db: &impl ConnectionTrait,
    identity: &Identity,
    sensor_model: sensors::Model,
) -> Result<sensors::Model, Error> {
    require_superuser(identity)?;

    let sensor = entity_api::sensor::create(db, sensor_model).await?;
    info!("Registered sensor {} ({})", sensor.name, sensor.id);

    Ok(sensor)
}

/// Every sensor `identity` may read or write. Superusers see all sensors with
/// full access; everyone else sees the sensors they hold a grant on.
pub async fn find_for_identity(
    db: &impl ConnectionTrait,
    identity: &Identity,
) -> Result<Vec<UserSensor>, Error> {
    let Some(user_id) = identity.id else {
        return Err(Error::entity(EntityErrorKind::Unauthenticated));
    };

    if identity.superuser {
        let sensors = entity_api::sensor::find_all(db).await?;
        return Ok(sensors
            .into_iter()
            .map(|sensor| UserSensor {
                id: sensor.id,
                user_id,
                name: sensor.name,
                sensor_type: sensor.sensor_type,
                read: true,
                write: true,
            })
            .collect());
    }

    let grants: HashMap<Id, (bool, bool)> =
        entity_api::sensor_permission::find_granted_by_user(db, user_id)
            .await?
            .into_iter()
            .map(|permission| (permission.sensor_id, (permission.read, permission.write)))
            .collect();

    let sensors = entity_api::sensor::find_by_ids(db, grants.keys().copied().collect()).await?;

    Ok(sensors
        .into_iter()
        .filter_map(|sensor| {
            let (read, write) = grants.get(&sensor.id).copied()?;
            Some(UserSensor {
                id: sensor.id,
                user_id,
                name: sensor.name,
                sensor_type: sensor.sensor_type,
                read,
                write,
            })
        })
        .collect())
}

/// Fails with `UnsupportedType` unless `sensor` is of `expected` type.
pub fn require_type(sensor: &sensors::Model, expected: SensorType) -> Result<(), Error> {
    if sensor.sensor_type == expected {
        Ok(())
    } else {
        debug!(
            "Sensor {} is {}, operation needs {expected}",
            sensor.id, sensor.sensor_type
        );
        Err(Error::entity(EntityErrorKind::UnsupportedType))
    }
}
