use crate::error::Result as WebResult;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::sensor_data::IndexParams;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::{sensor_data::Model, Id};
use log::*;

/// POST a new reading for a sensor
#[utoipa::path(
    post,
    path = "/sensor/{sensor_id}/data",
    params(
        ("sensor_id" = Uuid, Path, description = "Id of the sensor reporting the reading"),
    ),
    request_body = domain::sensor_data::Model,
    responses(
        (status = 201, description = "Successfully stored the reading", body = domain::sensor_data::Model),
        (status = 400, description = "The sensor does not take environmental readings"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No write permission on the sensor"),
        (status = 404, description = "Sensor not found"),
        (status = 422, description = "Unprocessable Entity")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(sensor_id): Path<Id>,
    Json(reading): Json<Model>,
) -> WebResult<impl IntoResponse> {
    debug!("POST reading for sensor {sensor_id} by user {}", user.id);

    let stored = domain::sensor_datum::create(
        app_state.db_conn_ref(),
        &app_state.event_publisher,
        &domain::user::identity(&user),
        sensor_id,
        reading,
    )
    .await?;

    debug!("Stored sensor reading: {stored:?}");

    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET the most recent readings of a sensor, oldest first
#[utoipa::path(
    get,
    path = "/sensor/{sensor_id}/data",
    params(
        ("sensor_id" = Uuid, Path, description = "Id of the sensor whose readings to retrieve"),
        IndexParams,
    ),
    responses(
        (status = 200, description = "Successfully retrieved the readings", body = [domain::sensor_data::Model]),
        (status = 400, description = "The sensor does not take environmental readings"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No read permission on the sensor"),
        (status = 404, description = "Sensor not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(sensor_id): Path<Id>,
    Query(params): Query<IndexParams>,
) -> WebResult<impl IntoResponse> {
    debug!(
        "GET {} readings of sensor {sensor_id} by user {}",
        params.amount, user.id
    );

    let readings = domain::sensor_datum::find_latest(
        app_state.db_conn_ref(),
        &domain::user::identity(&user),
        sensor_id,
        params.amount,
    )
    .await?;

    Ok(Json(readings))
}
