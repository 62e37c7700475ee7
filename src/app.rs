use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::{AppConfig, Environment, load_s3_client},
    database,
    error::{AppError, Result},
    routes,
    services::{image_generation_service::ImageGenerator, storage_service::Storage},
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub storage: Storage,
    pub image_generator: ImageGenerator,
    pub environment: Environment,
    pub jwt_secret: String,
}

impl AppState {
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let db = database::create_pool(&config.database).await?;
        let client = load_s3_client(&config.storage).await?;

        Ok(Self {
            db,
            storage: Storage {
                client,
                bucket: config.storage.bucket.clone(),
                assets_url: config.storage.assets_url.clone(),
            },
            image_generator: ImageGenerator::new(config.image_generation.clone())?,
            environment: config.environment,
            jwt_secret: config.auth.jwt_secret.clone(),
        })
    }
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let state = AppState::from_config(config).await?;

    tracing::info!("Application state ready ({:?})", config.environment);

    build_router(state, config)
}

/// Wires routes, CORS, tracing and the default body limit around a prepared state.
pub fn build_router(state: AppState, config: &AppConfig) -> Result<Router> {
    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::ConfigError(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_origin(allowed_origins);

    let app = routes::create_router(state.clone())
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(app)
}
