use domain::forecast::ForecastService;
use domain::forecast_cache::ForecastCache;
use domain::gateway::openweathermap::OpenWeatherMapClient;
use domain::sensor_permission::SensorReadPermission;
use log::*;
use relay::{ConnectionRegistry, Relay};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!(
        "Starting up Weather Station with {} runtime environment...",
        config.runtime_env()
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let provider = match OpenWeatherMapClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to set up the OpenWeatherMap client: {e}");
            std::process::exit(1);
        }
    };

    let forecast_cache = ForecastCache::new(config.forecast_cache_size, config.forecast_cache_ttl());
    let forecast_service = Arc::new(ForecastService::new(forecast_cache, provider));

    let connection_registry = Arc::new(ConnectionRegistry::new());
    let (event_publisher, event_receiver) = events::channel();

    let relay = Relay::new(
        Arc::clone(&connection_registry),
        Arc::new(SensorReadPermission::new(Arc::clone(&db))),
    );
    let relay_task = relay::relay::spawn(event_receiver, Arc::new(relay));

    let app_state = web::AppState::new(
        service::AppState::new(config, &db),
        forecast_service,
        connection_registry,
        event_publisher,
    );

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with error: {e}");
    }

    relay_task.abort();
}
