use crate::error::Error;
use crate::jwt::{self, AccessToken};
use crate::users;
use events::Identity;
use log::*;
use sea_orm::ConnectionTrait;
use serde::Deserialize;
use service::config::Config;
use utoipa::ToSchema;

pub use entity_api::user::{create, find_by_id, find_by_username};

/// Form fields of a token request.
#[derive(Clone, Deserialize, ToSchema)]
#[schema(as = domain::user::Credentials)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Keep the password out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Checks `credentials` and issues a bearer access token for the user.
pub async fn authenticate(
    db: &impl ConnectionTrait,
    config: &Config,
    credentials: &Credentials,
) -> Result<AccessToken, Error> {
    let user =
        entity_api::user::verify_credentials(db, &credentials.username, &credentials.password)
            .await?;

    info!("Issuing access token for user {}", user.id);
    jwt::encode_access_token(config, user.id)
}

/// Resolves a bearer token to the user it was issued for.
pub async fn find_by_access_token(
    db: &impl ConnectionTrait,
    config: &Config,
    token: &str,
) -> Result<users::Model, Error> {
    let claims = jwt::decode_access_token(config, token)?;
    Ok(find_by_id(db, claims.sub).await?)
}

/// The principal used for permission checks and live connections.
pub fn identity(user: &users::Model) -> Identity {
    Identity {
        id: Some(user.id),
        username: user.username.clone(),
        superuser: user.superuser,
    }
}
