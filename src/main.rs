use std::{net::SocketAddr, sync::Arc};

use axum::{routing::get, Router};
use http::HeaderValue;
use tokio::{signal, sync::mpsc};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing::{error, info};

use inventario_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }

    let db_arc = Arc::new(db_pool);

    // Select the broadcast backend for client notifications
    let broadcaster: Arc<dyn api::broadcast::Broadcaster> =
        match cfg.broadcast_backend.to_ascii_lowercase().as_str() {
            "redis" => match redis::Client::open(cfg.redis_url.clone()) {
                Ok(client) => {
                    info!("Using Redis broadcast backend");
                    Arc::new(api::broadcast::RedisBroadcaster::new(Arc::new(client)))
                }
                Err(err) => {
                    error!(
                        "Failed to initialize Redis broadcaster (falling back to in-memory): {}",
                        err
                    );
                    Arc::new(api::broadcast::InMemoryBroadcaster::default())
                }
            },
            _ => Arc::new(api::broadcast::InMemoryBroadcaster::default()),
        };

    // Init events and spawn the forwarding task
    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(
        event_rx,
        broadcaster.clone(),
        cfg.broadcast_channel.clone(),
    ));

    // Aggregate app services used by HTTP handlers
    let base_logger = api::logging::setup_logger(api::logging::LoggerConfig::default());
    let services = api::handlers::AppServices::new(
        db_arc.clone(),
        Arc::new(event_sender.clone()),
        base_logger,
    );

    // Compose shared app state
    let app_state = api::AppState {
        db: db_arc.clone(),
        config: cfg.clone(),
        event_sender,
        services,
        broadcaster,
    };

    let cors_layer = build_cors_layer(&cfg)?;

    // Build router: status/health + full v1 API + Swagger UI
    let app = Router::<api::AppState>::new()
        .route("/", get(|| async { "inventario-api up" }))
        .nest("/api/v1", api::api_v1_routes())
        .merge(api::openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(api::tracing::configure_http_tracing())
        // Apply compression
        .layer(CompressionLayer::new())
        // Apply CORS
        .layer(cors_layer)
        // Throttled expired-session sweep
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            api::middleware_helpers::session_cleanup::session_cleanup_middleware,
        ))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            api::middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(app_state);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("inventario-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Builds the CORS layer: explicit origins when configured, permissive in
/// development, otherwise startup fails rather than serving without a policy.
fn build_cors_layer(cfg: &api::config::AppConfig) -> Result<CorsLayer, String> {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|origin| {
            let trimmed = origin.trim();
            (!trimmed.is_empty())
                .then(|| HeaderValue::from_str(trimmed).ok())
                .flatten()
        })
        .collect();

    if !origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(cfg.cors_allow_credentials));
    }

    if cfg.should_allow_permissive_cors() {
        info!("Using permissive CORS; explicit origins were not configured");
        return Ok(CorsLayer::permissive());
    }

    error!("Missing CORS configuration; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
    Err("Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true".into())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
