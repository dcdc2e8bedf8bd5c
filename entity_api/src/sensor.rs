use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::sensors::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

pub async fn create(db: &impl ConnectionTrait, sensor_model: Model) -> Result<Model, Error> {
    debug!(
        "New sensor {} of type {}",
        sensor_model.name, sensor_model.sensor_type
    );

    let now = Utc::now();
    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        name: Set(sensor_model.name),
        sensor_type: Set(sensor_model.sensor_type),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

pub async fn find_all(db: &impl ConnectionTrait) -> Result<Vec<Model>, Error> {
    Ok(Entity::find().order_by_asc(Column::Name).all(db).await?)
}

pub async fn find_by_ids(db: &impl ConnectionTrait, ids: Vec<Id>) -> Result<Vec<Model>, Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(Entity::find()
        .filter(Column::Id.is_in(ids))
        .order_by_asc(Column::Name)
        .all(db)
        .await?)
}
