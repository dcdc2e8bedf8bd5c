use crate::error::Result as WebResult;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{sensor as SensorApi, sensors::Model, Id};
use log::*;

/// POST register a new sensor (superusers only)
#[utoipa::path(
    post,
    path = "/sensor",
    request_body = domain::sensors::Model,
    responses(
        (status = 201, description = "Successfully registered the sensor", body = domain::sensors::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only superusers may register sensors"),
        (status = 422, description = "Unprocessable Entity")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(sensor_model): Json<Model>,
) -> WebResult<impl IntoResponse> {
    debug!("POST new sensor {sensor_model:?} by user {}", user.id);

    let sensor = SensorApi::create(
        app_state.db_conn_ref(),
        &domain::user::identity(&user),
        sensor_model,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(sensor)))
}

/// GET all sensors the caller may read or write
#[utoipa::path(
    get,
    path = "/sensor/list",
    responses(
        (status = 200, description = "Sensors with the caller's access flags", body = [domain::sensor::UserSensor]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    debug!("GET sensor list for user {}", user.id);

    let sensors =
        SensorApi::find_for_identity(app_state.db_conn_ref(), &domain::user::identity(&user))
            .await?;

    Ok(Json(sensors))
}

/// GET a sensor by id
#[utoipa::path(
    get,
    path = "/sensor/{sensor_id}",
    params(
        ("sensor_id" = Uuid, Path, description = "Id of the sensor to retrieve"),
    ),
    responses(
        (status = 200, description = "Successfully retrieved the sensor", body = domain::sensors::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Sensor not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser(_user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(sensor_id): Path<Id>,
) -> WebResult<impl IntoResponse> {
    debug!("GET sensor {sensor_id}");

    let sensor = SensorApi::find_by_id(app_state.db_conn_ref(), sensor_id).await?;

    Ok(Json(sensor))
}
