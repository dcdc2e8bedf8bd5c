use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};

pub async fn create(
    db: &impl ConnectionTrait,
    username: &str,
    password: &str,
    superuser: bool,
) -> Result<Model, Error> {
    debug!("Creating user {username} (superuser: {superuser})");

    let now = Utc::now();
    let user_active_model = ActiveModel {
        id: Set(Id::new_v4()),
        username: Set(username.to_owned()),
        password: Set(password_auth::generate_hash(password)),
        superuser: Set(superuser),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(user_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

pub async fn find_by_username(
    db: &impl ConnectionTrait,
    username: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Username.eq(username))
        .one(db)
        .await?)
}

/// Looks up `username` and checks `password` against the stored hash.
/// Unknown users and wrong passwords are reported identically.
pub async fn verify_credentials(
    db: &impl ConnectionTrait,
    username: &str,
    password: &str,
) -> Result<Model, Error> {
    let unauthenticated = || Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordUnauthenticated,
    };

    let user = find_by_username(db, username)
        .await?
        .ok_or_else(unauthenticated)?;

    match password_auth::verify_password(password, &user.password) {
        Ok(()) => Ok(user),
        Err(_) => {
            debug!("Password mismatch for user {username}");
            Err(unauthenticated())
        }
    }
}
