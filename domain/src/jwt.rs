//! Bearer access tokens: HS256-signed JWTs whose subject is the user id.

use crate::error::Error;
use crate::Id;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use service::config::Config;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Id,
    pub exp: i64,
    pub iat: i64,
}

/// Response body of a successful token request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

fn secret(config: &Config) -> Result<String, Error> {
    config.jwt_secret().ok_or_else(|| {
        warn!("Failed to get JWT secret from config");
        Error::config()
    })
}

/// Issues a token for `user_id` that expires after the configured number of minutes.
pub fn encode_access_token(config: &Config, user_id: Id) -> Result<AccessToken, Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        exp: (now + Duration::minutes(config.access_token_expiry_minutes)).timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret(config)?.as_bytes()),
    )?;

    Ok(AccessToken {
        access_token: token,
        token_type: "bearer".to_string(),
    })
}

/// Verifies the signature and expiry of `token` and returns its claims.
pub fn decode_access_token(config: &Config, token: &str) -> Result<Claims, Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret(config)?.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        debug!("Rejected access token: {e}");
        Error::from(e)
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};

    fn config_with_secret(secret: &str) -> Config {
        Config::from_args(["weather_station_rs"]).set_jwt_secret(secret.to_string())
    }

    fn is_unauthenticated(result: &Result<Claims, Error>) -> bool {
        matches!(
            result,
            Err(Error {
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                    EntityErrorKind::Unauthenticated
                )),
                ..
            })
        )
    }

    #[test]
    fn test_issued_token_decodes_to_its_user() -> Result<(), Error> {
        let config = config_with_secret("s3cr3t");
        let user_id = Id::new_v4();

        let token = encode_access_token(&config, user_id)?;
        let claims = decode_access_token(&config, &token.access_token)?;

        assert_eq!(token.token_type, "bearer");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
        Ok(())
    }

    #[test]
    fn test_token_signed_with_another_secret_is_rejected() -> Result<(), Error> {
        let token = encode_access_token(&config_with_secret("one"), Id::new_v4())?;

        let result = decode_access_token(&config_with_secret("two"), &token.access_token);

        assert!(is_unauthenticated(&result));
        Ok(())
    }

    #[test]
    fn test_expired_token_is_rejected() -> Result<(), Error> {
        let config = config_with_secret("s3cr3t");
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: Id::new_v4(),
            exp: (past + Duration::minutes(30)).timestamp(),
            iat: past.timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"s3cr3t"),
        )?;

        assert!(is_unauthenticated(&decode_access_token(&config, &token)));
        Ok(())
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let config = config_with_secret("s3cr3t");

        assert!(is_unauthenticated(&decode_access_token(&config, "not.a.jwt")));
    }
}
