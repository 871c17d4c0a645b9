use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use mingle::config::Settings;
use mingle::routes::{self, events::AppState};
use mingle::services::{
    AppwriteClient, AppwriteCollections, CacheManager, CachedDirectory, Directory, PostgresClient,
};
use mingle::MatchEngine;
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn config_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(config_error(e));
        }
    };

    // LOG_LEVEL / LOG_FORMAT still win over the config file
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());
    init_tracing(&log_level, &log_format);

    info!("Starting Mingle match service...");

    // Initialize PostgreSQL client
    let db_max_conn = settings.database.max_connections.unwrap_or(10);
    let db_min_conn = settings.database.min_connections.unwrap_or(1);

    let postgres = PostgresClient::from_settings(
        &settings.database.url,
        Some(db_max_conn),
        Some(db_min_conn),
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await
    .map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        config_error(e)
    })?;

    info!("PostgreSQL client initialized (max: {} connections)", db_max_conn);

    // Initialize Appwrite client
    let collections = AppwriteCollections {
        attendees: settings.collection.attendees.clone(),
        exclusions: settings.collection.exclusions.clone(),
        events: settings.collection.events.clone(),
    };

    let appwrite = AppwriteClient::new(
        settings.appwrite.endpoint.clone(),
        settings.appwrite.api_key.clone(),
        settings.appwrite.project_id.clone(),
        settings.appwrite.database_id.clone(),
        collections,
    )
    .map_err(|e| {
        error!("Failed to build Appwrite client: {}", e);
        config_error(e)
    })?;

    info!("Appwrite client initialized");

    // Roster caching is optional; the service runs uncached without Redis
    let directory: Arc<dyn Directory> = if settings.cache.enabled {
        let cache_ttl = settings.cache.ttl_secs.unwrap_or(60);
        let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

        match CacheManager::new(&settings.cache.redis_url, l1_cache_size, cache_ttl).await {
            Ok(cache) => {
                info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
                Arc::new(CachedDirectory::new(Arc::new(appwrite), Arc::new(cache)))
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), running without cache", e);
                Arc::new(appwrite)
            }
        }
    } else {
        info!("Caching disabled by configuration");
        Arc::new(appwrite)
    };

    let policy = settings.matchmaking.policy();
    info!("Match engine initialized with policy: {:?}", policy);

    let engine = MatchEngine::new(directory, Arc::new(postgres), policy);

    // Build application state
    let app_state = AppState {
        engine: Arc::new(engine),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
