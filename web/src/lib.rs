use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use domain::forecast::ForecastService;
use events::EventPublisher;
use log::*;
use relay::ConnectionRegistry;
use sea_orm::DatabaseConnection;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
mod extractors;
mod params;
pub mod router;
mod ws;

/// Everything a request handler can reach: the infrastructure state from
/// `service` plus the forecast service and the live-push plumbing.
#[derive(Clone)]
pub struct AppState {
    service: service::AppState,
    pub forecast_service: Arc<ForecastService>,
    pub connection_registry: Arc<ConnectionRegistry>,
    pub event_publisher: EventPublisher,
}

impl AppState {
    pub fn new(
        service: service::AppState,
        forecast_service: Arc<ForecastService>,
        connection_registry: Arc<ConnectionRegistry>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            service,
            forecast_service,
            connection_registry,
            event_publisher,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service.db_conn_ref()
    }

    pub fn config(&self) -> &Config {
        &self.service.config
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let config = app_state.config();
    let host = config.interface.as_deref().unwrap_or("127.0.0.1");
    let listen_addr = format!("{host}:{}", config.port);

    info!("Server starting... listening for connections on http://{listen_addr}");

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_origin(allowed_origins);

    let listener = TcpListener::bind(listen_addr).await?;

    axum::serve(
        listener,
        router::define_routes(app_state)
            .layer(cors_layer)
            .into_make_service(),
    )
    .await
}
