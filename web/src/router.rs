use crate::{
    controller::{
        forecast_controller, health_check_controller, sensor_controller, sensor_data_controller,
        sensor_permission_controller, user_controller, user_session_controller,
    },
    ws, AppState,
};
use axum::{
    routing::{delete, get, post, put},
    Router,
};

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Weather Station API"
        ),
        paths(
            health_check_controller::health_check,
            user_session_controller::token,
            forecast_controller::read,
            sensor_controller::create,
            sensor_controller::index,
            sensor_controller::read,
            sensor_data_controller::create,
            sensor_data_controller::index,
            sensor_permission_controller::update,
            sensor_permission_controller::read,
            sensor_permission_controller::delete,
            user_controller::me,
            ws::handler::ws_handler,
        ),
        components(
            schemas(
                domain::forecast::Forecast,
                domain::jwt::AccessToken,
                domain::sensor::UserSensor,
                domain::sensor_data::Model,
                domain::sensor_permissions::Model,
                domain::sensor_type::SensorType,
                domain::sensors::Model,
                domain::user::Credentials,
                domain::users::Model,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "weather_station", description = "Weather forecasts and live sensor readings")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines the bearer token authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token returned from POST /token"))
                        .build(),
                ),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(user_session_routes(app_state.clone()))
        .merge(forecast_routes(app_state.clone()))
        .merge(sensor_routes(app_state.clone()))
        .merge(sensor_data_routes(app_state.clone()))
        .merge(sensor_permission_routes(app_state.clone()))
        .merge(user_routes(app_state.clone()))
        .merge(ws_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/token", post(user_session_controller::token))
        .with_state(app_state)
}

fn forecast_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/forecast", get(forecast_controller::read))
        .with_state(app_state)
}

fn sensor_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sensor", post(sensor_controller::create))
        .route("/sensor/list", get(sensor_controller::index))
        .route("/sensor/:sensor_id", get(sensor_controller::read))
        .with_state(app_state)
}

fn sensor_data_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/sensor/:sensor_id/data",
            post(sensor_data_controller::create).get(sensor_data_controller::index),
        )
        .with_state(app_state)
}

fn sensor_permission_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/permissions/sensor",
            put(sensor_permission_controller::update),
        )
        .route(
            "/permissions/sensor",
            get(sensor_permission_controller::read),
        )
        .route(
            "/permissions/sensor",
            delete(sensor_permission_controller::delete),
        )
        .with_state(app_state)
}

fn user_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/users/me", get(user_controller::me))
        .with_state(app_state)
}

fn ws_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::handler::ws_handler))
        .with_state(app_state)
}
