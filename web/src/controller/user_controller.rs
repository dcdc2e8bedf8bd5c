use crate::extractors::authenticated_user::AuthenticatedUser;
use axum::response::IntoResponse;
use axum::Json;
use log::*;

/// GET the user the bearer token was issued for
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "The current user", body = domain::users::Model),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    debug!("GET current user {}", user.id);

    Json(user)
}
