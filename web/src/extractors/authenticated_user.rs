use crate::extractors::RejectionType;
use crate::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use domain::users;
use log::*;

pub(crate) struct AuthenticatedUser(pub users::Model);

fn unauthorized() -> RejectionType {
    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = RejectionType;

    // Reads `Authorization: Bearer <token>`, verifies the token and loads the user it
    // was issued for. Every failure is reported as 401 without detail.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                trace!("Request without bearer token");
                unauthorized()
            })?;

        match domain::user::find_by_access_token(state.db_conn_ref(), state.config(), token).await
        {
            Ok(user) => Ok(AuthenticatedUser(user)),
            Err(e) => {
                debug!("Bearer token rejected: {e}");
                Err(unauthorized())
            }
        }
    }
}
