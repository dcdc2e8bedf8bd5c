use serde::Deserialize;
use utoipa::IntoParams;

/// Coordinates a forecast is requested for. Values are used verbatim as the
/// cache key and upstream query, so `52.5` and `52.50` are different locations.
#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct ForecastParams {
    /// Latitude in decimal degrees
    pub(crate) lat: String,
    /// Longitude in decimal degrees
    pub(crate) lon: String,
}
