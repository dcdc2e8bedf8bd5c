//! Per-sensor access control. Superusers may read and write every sensor;
//! everyone else needs a `sensor_permissions` row granting the access.

use crate::error::{EntityErrorKind, Error};
use crate::{sensor_permissions, Id};
use async_trait::async_trait;
use events::{BoxError, Identity, PermissionCheck};
use log::*;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionKind {
    Read,
    Write,
}

/// Succeeds when `identity` holds `kind` access to `sensor_id`, otherwise
/// returns a `Forbidden` error.
pub async fn authorize(
    db: &impl ConnectionTrait,
    identity: &Identity,
    sensor_id: Id,
    kind: PermissionKind,
) -> Result<(), Error> {
    if identity.superuser {
        return Ok(());
    }

    let Some(user_id) = identity.id else {
        return Err(Error::entity(EntityErrorKind::Unauthenticated));
    };

    let granted =
        entity_api::sensor_permission::find_by_user_and_sensor(db, user_id, sensor_id)
            .await?
            .is_some_and(|permission| match kind {
                PermissionKind::Read => permission.read,
                PermissionKind::Write => permission.write,
            });

    if granted {
        Ok(())
    } else {
        debug!("User {user_id} lacks {kind:?} permission on sensor {sensor_id}");
        Err(Error::entity(EntityErrorKind::Forbidden))
    }
}

/// Succeeds only for superusers. Sensor and permission management is theirs alone.
pub fn require_superuser(identity: &Identity) -> Result<(), Error> {
    if identity.superuser {
        Ok(())
    } else {
        debug!("User {} is not a superuser", identity.username);
        Err(Error::entity(EntityErrorKind::Forbidden))
    }
}

/// Grants the read and write flags of `permission` to its user on its sensor,
/// replacing any earlier grant for the pair.
pub async fn put(
    db: &impl ConnectionTrait,
    identity: &Identity,
    permission: sensor_permissions::Model,
) -> Result<sensor_permissions::Model, Error> {
    require_superuser(identity)?;
    Ok(entity_api::sensor_permission::upsert(db, permission).await?)
}

pub async fn find(
    db: &impl ConnectionTrait,
    identity: &Identity,
    user_id: Id,
    sensor_id: Id,
) -> Result<sensor_permissions::Model, Error> {
    require_superuser(identity)?;
    entity_api::sensor_permission::find_by_user_and_sensor(db, user_id, sensor_id)
        .await?
        .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))
}

pub async fn delete(
    db: &impl ConnectionTrait,
    identity: &Identity,
    user_id: Id,
    sensor_id: Id,
) -> Result<(), Error> {
    require_superuser(identity)?;
    info!("Revoking access of user {user_id} to sensor {sensor_id}");
    Ok(entity_api::sensor_permission::delete(db, user_id, sensor_id).await?)
}

/// Read permission check used to filter live sensor events per recipient.
pub struct SensorReadPermission {
    db: Arc<DatabaseConnection>,
}

impl SensorReadPermission {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PermissionCheck for SensorReadPermission {
    async fn can_read(&self, identity: &Identity, resource_id: Id) -> Result<bool, BoxError> {
        authorize(self.db.as_ref(), identity, resource_id, PermissionKind::Read).await?;
        Ok(true)
    }
}
