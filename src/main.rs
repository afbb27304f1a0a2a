use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use japan_itinerary_api::config::{AppConfig, StorageBackend};
use japan_itinerary_api::db::{
    memory::MemoryStore,
    mongo::{create_mongo_client, MongoStore},
    repository::Store,
};
use japan_itinerary_api::routes;
use japan_itinerary_api::services::gemini_client::{GeminiClient, ItineraryModel};
use japan_itinerary_api::state::AppState;

fn io_error(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, message)
}

async fn build_store(config: &AppConfig) -> std::io::Result<Arc<dyn Store>> {
    match config.storage {
        StorageBackend::Mongo => {
            let uri = config
                .mongodb_uri
                .as_deref()
                .ok_or_else(|| io_error("MONGODB_URI must be set".to_string()))?;
            let client = create_mongo_client(uri)
                .await
                .map_err(|err| io_error(format!("MongoDB connection failed: {}", err)))?;

            let store = MongoStore::new(client, &config.mongodb_database);
            store
                .ensure_indexes()
                .await
                .map_err(|err| io_error(format!("Failed to create indexes: {}", err)))?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn cors(config: &AppConfig) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);
    match &config.cors_allowed_origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors.allow_any_origin(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|err| io_error(err.to_string()))?;
    if config.gemini.api_key.is_none() {
        log::warn!("GEMINI_API_KEY is not set; itinerary generation will fail");
    }

    let store = build_store(&config).await?;
    let model: Arc<dyn ItineraryModel> = Arc::new(GeminiClient::new(&config.gemini));
    let (host, port) = (config.host.clone(), config.port);
    let state = AppState::new(config, store, model);

    log::info!(
        "Starting HTTP server on {}:{} with the {} store",
        host,
        port,
        state.store.backend()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(cors(&state.config))
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
