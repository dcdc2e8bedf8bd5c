use crate::error::Result as WebResult;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::params::forecast::ForecastParams;
use crate::AppState;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use log::*;

/// GET the current, hourly and daily forecast for a location
#[utoipa::path(
    get,
    path = "/forecast",
    params(ForecastParams),
    responses(
        (status = 200, description = "Successfully retrieved the forecast", body = domain::forecast::Forecast),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "The weather provider could not be reached")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Query(params): Query<ForecastParams>,
) -> WebResult<impl IntoResponse> {
    debug!(
        "GET forecast for {};{} by user {}",
        params.lat, params.lon, user.id
    );

    let forecast = app_state
        .forecast_service
        .get_forecast(&params.lat, &params.lon)
        .await?;

    Ok(Json(forecast))
}
