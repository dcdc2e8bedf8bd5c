use crate::error::Result as WebResult;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Form, Json};
use domain::user::Credentials;
use log::*;

/// Exchanges username and password for a bearer access token.
///
/// Pass the token back on every protected call, e.g.:
/// curl --header "Authorization: Bearer <access_token>" http://localhost:4000/forecast?lat=52.52&lon=13.41
#[utoipa::path(
    post,
    path = "/token",
    request_body(content = domain::user::Credentials, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Issues a bearer access token", body = domain::jwt::AccessToken),
        (status = 401, description = "Unauthorized"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn token(
    State(app_state): State<AppState>,
    Form(credentials): Form<Credentials>,
) -> WebResult<impl IntoResponse> {
    debug!("Token requested for {}", credentials.username);

    let access_token =
        domain::user::authenticate(app_state.db_conn_ref(), app_state.config(), &credentials)
            .await?;

    Ok(Json(access_token))
}
