use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, StatusCode},
    middleware::from_fn,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use parentos::config::{self, AppConfig};
use parentos::database::manager::DatabaseManager;
use parentos::handlers;
use parentos::middleware::require_auth;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Loading the config singleton refuses to start on missing required vars
    let config = config::config();
    tracing::info!("Starting ParentOS API in {:?} mode", config.environment);

    if let Err(e) = DatabaseManager::init(&config.database_url).await {
        tracing::error!("database initialization failed: {}", e);
        std::process::exit(1);
    }

    let app = app(config);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("ParentOS API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(config: &AppConfig) -> Router {
    // Everything behind the bearer-token middleware
    let protected = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .merge(parent_routes())
        .merge(appointment_routes())
        .merge(note_routes())
        .route_layer(from_fn(require_auth));

    let api = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .merge(protected)
        .fallback(api_not_found);

    // Built client with SPA fallback to its root document
    let client = ServeDir::new(&config.client_dist_dir).not_found_service(ServeFile::new(
        format!("{}/index.html", config.client_dist_dir),
    ));

    Router::new()
        .nest("/api", api)
        .fallback_service(client)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.max_request_size_bytes))
}

fn parent_routes() -> Router {
    use handlers::parents;

    Router::new()
        .route("/parents", get(parents::list).post(parents::create))
        .route(
            "/parents/:id",
            get(parents::get).put(parents::update).delete(parents::remove),
        )
}

fn appointment_routes() -> Router {
    use handlers::appointments;

    Router::new()
        .route(
            "/appointments",
            get(appointments::list).post(appointments::create),
        )
        .route(
            "/appointments/parent/:parent_id",
            get(appointments::list_for_parent),
        )
        .route(
            "/appointments/:id",
            axum::routing::put(appointments::update).delete(appointments::remove),
        )
}

fn note_routes() -> Router {
    use handlers::notes;

    Router::new()
        .route("/notes", get(notes::list).post(notes::create))
        .route("/notes/parent/:parent_id", get(notes::list_for_parent))
        .route("/notes/type/:note_type", get(notes::list_by_type))
        .route(
            "/notes/:id",
            axum::routing::put(notes::update).delete(notes::remove),
        )
}

/// Unmatched /api/* paths get JSON, not the SPA shell
async fn api_not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    match config
        .client_origin
        .as_deref()
        .and_then(|origin| origin.parse::<HeaderValue>().ok())
    {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        None => CorsLayer::permissive(),
    }
}
