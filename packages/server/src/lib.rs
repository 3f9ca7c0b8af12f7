#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the Montreal crime dashboard.
//!
//! Serves the figures of the five dashboard pages as Plotly JSON, plus the
//! category legend, the PDQ reference table, and cache controls. The
//! incident table and the joined map table are loaded lazily on the first
//! request that needs them and shared by every worker.

pub mod config;
mod handlers;
pub mod interactive;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use crime_dashboard_data::{DataManager, IncidentSource};
use crime_dashboard_map::MapService;
use crime_dashboard_server_models::ErrorResponse;

pub use config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Incident data, loaded on first use.
    pub source: Arc<dyn IncidentSource>,
    /// Map pipeline over the same incidents.
    pub map: MapService,
}

impl AppState {
    /// Wires a [`DataManager`] and a [`MapService`] for the configured (or
    /// discovered) input files.
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        let source: Arc<dyn IncidentSource> =
            Arc::new(DataManager::discover(config.data_path.as_deref()));
        let map = MapService::discover(Arc::clone(&source), config.districts_path.as_deref());
        Self { source, map }
    }

    /// Builds state over an arbitrary incident source and boundary file.
    #[must_use]
    pub fn with_source(source: Arc<dyn IncidentSource>, districts: impl Into<PathBuf>) -> Self {
        let map = MapService::new(Arc::clone(&source), districts);
        Self { source, map }
    }

    /// Path of the district boundary file in use.
    #[must_use]
    pub fn districts_path(&self) -> &Path {
        self.map.geometry_path()
    }
}

/// Registers the `/api` routes and the query error handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let body = ErrorResponse::new(err.to_string());
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    }))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/categories", web::get().to(handlers::categories))
            .route("/map", web::get().to(handlers::map))
            .route("/timeline", web::get().to(handlers::timeline))
            .route(
                "/temporal/controls",
                web::get().to(handlers::temporal_controls),
            )
            .route("/temporal", web::get().to(handlers::temporal))
            .route("/scatter", web::get().to(handlers::scatter))
            .route("/heatmap", web::get().to(handlers::heatmap))
            .route("/pdq", web::get().to(handlers::pdq))
            .route("/cache", web::get().to(handlers::cache_status))
            .route("/cache/clear", web::post().to(handlers::clear_cache)),
    );
}

/// Starts the HTTP server and runs until shutdown.
///
/// # Errors
///
/// Returns an `std::io::Error` if the listen address can't be bound.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(&config));
    log::info!("Districts from {}", state.districts_path().display());

    let ServerConfig { bind_addr, port, .. } = config;
    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
