use crate::error::Result as WebResult;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::sensor_permission::PermissionParams;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{sensor_permission as SensorPermissionApi, sensor_permissions::Model};
use log::*;

/// PUT create or replace a user's grant on a sensor (superusers only)
#[utoipa::path(
    put,
    path = "/permissions/sensor",
    request_body = domain::sensor_permissions::Model,
    responses(
        (status = 201, description = "Successfully stored the permission", body = domain::sensor_permissions::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only superusers may manage permissions"),
        (status = 422, description = "Unprocessable Entity")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(permission_model): Json<Model>,
) -> WebResult<impl IntoResponse> {
    debug!("PUT sensor permission {permission_model:?} by user {}", user.id);

    let permission = SensorPermissionApi::put(
        app_state.db_conn_ref(),
        &domain::user::identity(&user),
        permission_model,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(permission)))
}

/// GET a user's grant on a sensor (superusers only)
#[utoipa::path(
    get,
    path = "/permissions/sensor",
    params(PermissionParams),
    responses(
        (status = 200, description = "Successfully retrieved the permission", body = domain::sensor_permissions::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only superusers may manage permissions"),
        (status = 404, description = "No such permission")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(params): Query<PermissionParams>,
) -> WebResult<impl IntoResponse> {
    debug!("GET sensor permission {params:?} by user {}", user.id);

    let permission = SensorPermissionApi::find(
        app_state.db_conn_ref(),
        &domain::user::identity(&user),
        params.user_id,
        params.sensor_id,
    )
    .await?;

    Ok(Json(permission))
}

/// DELETE a user's grant on a sensor (superusers only)
#[utoipa::path(
    delete,
    path = "/permissions/sensor",
    params(PermissionParams),
    responses(
        (status = 204, description = "Successfully revoked the permission"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only superusers may manage permissions"),
        (status = 404, description = "No such permission")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(params): Query<PermissionParams>,
) -> WebResult<impl IntoResponse> {
    debug!("DELETE sensor permission {params:?} by user {}", user.id);

    SensorPermissionApi::delete(
        app_state.db_conn_ref(),
        &domain::user::identity(&user),
        params.user_id,
        params.sensor_id,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
