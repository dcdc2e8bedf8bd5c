use crate::error::{DomainErrorKind, Error, InternalErrorKind};
use crate::sensor::require_type;
use crate::sensor_permission::{self, PermissionKind};
use crate::{sensor_data, sensor_type::SensorType, Id};
use events::{DomainEvent, EventPublisher, Identity};
use log::*;
use sea_orm::ConnectionTrait;

/// Stores a reading for `sensor_id` on behalf of `identity` and announces it
/// to live clients.
///
/// An unknown sensor is reported before a missing write permission, and only
/// environmental sensors take readings. The event is published after the row
/// is stored; a shut-down event queue does not fail the request.
pub async fn create(
    db: &impl ConnectionTrait,
    publisher: &EventPublisher,
    identity: &Identity,
    sensor_id: Id,
    reading: sensor_data::Model,
) -> Result<sensor_data::Model, Error> {
    let sensor = entity_api::sensor::find_by_id(db, sensor_id).await?;
    sensor_permission::authorize(db, identity, sensor.id, PermissionKind::Write).await?;
    require_type(&sensor, SensorType::Environmental)?;

    let stored = entity_api::sensor_datum::create(db, sensor.id, reading).await?;

    let payload = serde_json::to_value(&stored).map_err(|e| {
        warn!("Failed to serialize sensor reading {}: {e:?}", stored.id);
        Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to serialize sensor reading".to_string(),
            )),
        }
    })?;

    if !publisher.publish(DomainEvent::SensorDataCreated {
        sensor_id: Some(stored.sensor_id),
        sensor_data: payload,
    }) {
        warn!("Sensor reading {} stored but not relayed", stored.id);
    }

    Ok(stored)
}

/// The `amount` most recent readings of an environmental sensor, oldest first.
/// Requires read permission on the sensor.
pub async fn find_latest(
    db: &impl ConnectionTrait,
    identity: &Identity,
    sensor_id: Id,
    amount: u64,
) -> Result<Vec<sensor_data::Model>, Error> {
    let sensor = entity_api::sensor::find_by_id(db, sensor_id).await?;
    sensor_permission::authorize(db, identity, sensor.id, PermissionKind::Read).await?;
    require_type(&sensor, SensorType::Environmental)?;

    Ok(entity_api::sensor_datum::find_latest(db, sensor.id, amount).await?)
}
