use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::sensor_permissions::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, Set, Unchanged,
};

/// Returns the permission row linking `user_id` to `sensor_id`, if one was granted.
pub async fn find_by_user_and_sensor(
    db: &impl ConnectionTrait,
    user_id: Id,
    sensor_id: Id,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(
            Condition::all()
                .add(Column::UserId.eq(user_id))
                .add(Column::SensorId.eq(sensor_id)),
        )
        .one(db)
        .await?)
}

/// Rows granting `user_id` read or write access to any sensor.
pub async fn find_granted_by_user(
    db: &impl ConnectionTrait,
    user_id: Id,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(
            Condition::all().add(Column::UserId.eq(user_id)).add(
                Condition::any()
                    .add(Column::Read.eq(true))
                    .add(Column::Write.eq(true)),
            ),
        )
        .all(db)
        .await?)
}

/// Creates the grant for the model's user and sensor, or overwrites the read and
/// write flags of the existing one.
pub async fn upsert(db: &impl ConnectionTrait, permission_model: Model) -> Result<Model, Error> {
    let now = Utc::now();

    match find_by_user_and_sensor(db, permission_model.user_id, permission_model.sensor_id)
        .await?
    {
        Some(existing) => {
            debug!("Updating sensor permission {}", existing.id);

            let active_model = ActiveModel {
                id: Unchanged(existing.id),
                user_id: Unchanged(existing.user_id),
                sensor_id: Unchanged(existing.sensor_id),
                read: Set(permission_model.read),
                write: Set(permission_model.write),
                created_at: Unchanged(existing.created_at),
                updated_at: Set(now.into()),
            };

            Ok(active_model.update(db).await?)
        }
        None => {
            debug!(
                "Granting user {} access to sensor {}",
                permission_model.user_id, permission_model.sensor_id
            );

            let active_model = ActiveModel {
                id: Set(Id::new_v4()),
                user_id: Set(permission_model.user_id),
                sensor_id: Set(permission_model.sensor_id),
                read: Set(permission_model.read),
                write: Set(permission_model.write),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };

            Ok(active_model.insert(db).await?)
        }
    }
}

pub async fn delete(db: &impl ConnectionTrait, user_id: Id, sensor_id: Id) -> Result<(), Error> {
    let permission = find_by_user_and_sensor(db, user_id, sensor_id)
        .await?
        .ok_or_else(|| Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        })?;

    permission.delete(db).await?;

    Ok(())
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn permission(read: bool, write: bool) -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            user_id: Id::new_v4(),
            sensor_id: Id::new_v4(),
            read,
            write,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn find_by_user_and_sensor_returns_granted_row() -> Result<(), Error> {
        let permission = permission(true, false);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[permission.clone()]])
            .into_connection();

        let found =
            find_by_user_and_sensor(&db, permission.user_id, permission.sensor_id).await?;

        assert_eq!(found, Some(permission));
        Ok(())
    }

    #[tokio::test]
    async fn find_by_user_and_sensor_returns_none_without_grant() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        let found = find_by_user_and_sensor(&db, Id::new_v4(), Id::new_v4()).await?;

        assert_eq!(found, None);
        Ok(())
    }

    #[tokio::test]
    async fn upsert_inserts_a_new_grant() -> Result<(), Error> {
        let granted = permission(true, true);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .append_query_results([[granted.clone()]])
            .into_connection();

        let stored = upsert(&db, granted.clone()).await?;

        assert_eq!(stored, granted);
        Ok(())
    }

    #[tokio::test]
    async fn upsert_keeps_the_existing_row_id() -> Result<(), Error> {
        let existing = permission(true, false);
        let requested = Model {
            id: Id::new_v4(),
            read: false,
            write: true,
            ..existing.clone()
        };
        let updated = Model {
            read: false,
            write: true,
            ..existing.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing.clone()]])
            .append_query_results([[updated.clone()]])
            .into_connection();

        let stored = upsert(&db, requested).await?;

        assert_eq!(stored.id, existing.id);
        assert!(!stored.read);
        assert!(stored.write);
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_an_existing_grant() -> Result<(), Error> {
        let existing = permission(true, false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        delete(&db, existing.user_id, existing.sensor_id).await
    }

    #[tokio::test]
    async fn delete_without_grant_is_record_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        let result = delete(&db, Id::new_v4(), Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }
}
