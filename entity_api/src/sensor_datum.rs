use super::error::Error;
use chrono::Utc;
use entity::sensor_data::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// Stores a new reading for `sensor_id`. Id and timestamp are assigned here.
pub async fn create(
    db: &impl ConnectionTrait,
    sensor_id: Id,
    reading: Model,
) -> Result<Model, Error> {
    debug!("New sensor reading for sensor {sensor_id}: {reading:?}");

    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        sensor_id: Set(sensor_id),
        temperature: Set(reading.temperature),
        humidity: Set(reading.humidity),
        pressure: Set(reading.pressure),
        voltage: Set(reading.voltage),
        created_at: Set(Utc::now().into()),
    };

    Ok(active_model.insert(db).await?)
}

/// The `amount` most recent readings of `sensor_id`, oldest first.
pub async fn find_latest(
    db: &impl ConnectionTrait,
    sensor_id: Id,
    amount: u64,
) -> Result<Vec<Model>, Error> {
    let mut readings = Entity::find()
        .filter(Column::SensorId.eq(sensor_id))
        .order_by_desc(Column::CreatedAt)
        .limit(amount)
        .all(db)
        .await?;

    readings.reverse();
    Ok(readings)
}
