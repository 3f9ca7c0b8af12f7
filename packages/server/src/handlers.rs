//! HTTP handler functions for the crime dashboard API.
//!
//! Figure building reads and aggregates whole tables, so it runs on the
//! blocking pool via [`web::block`].

use std::fmt::Display;

use actix_web::error::BlockingError;
use actix_web::{HttpResponse, web};
use crime_dashboard_analytics::{heatmap, reference, scatter, temporal, timeline};
use crime_dashboard_crime_models::CrimeCategory;
use crime_dashboard_map::{MapError, validate_point_limit};
use crime_dashboard_server_models::{
    CacheStatus, CategoryInfo, ErrorResponse, HealthResponse, MapQuery, TemporalQuery,
    TimelineQuery,
};
use serde::Serialize;

use crate::AppState;

fn bad_request(error: &impl Display) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse::new(error.to_string()))
}

fn internal_error(what: &str, error: &impl Display) -> HttpResponse {
    log::error!("{what}: {error}");
    HttpResponse::InternalServerError().json(ErrorResponse::new(format!("{what}: {error}")))
}

/// Turns the outcome of a blocking figure build into a response.
fn respond<T: Serialize, E: Display>(
    what: &str,
    result: Result<Result<T, E>, BlockingError>,
) -> HttpResponse {
    match result {
        Ok(Ok(body)) => HttpResponse::Ok().json(body),
        Ok(Err(e)) => internal_error(what, &e),
        Err(e) => internal_error(what, &e),
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/categories`
///
/// Returns every category with its map colour, in legend order.
pub async fn categories() -> HttpResponse {
    let categories = CrimeCategory::all()
        .iter()
        .copied()
        .map(CategoryInfo::from)
        .collect::<Vec<_>>();

    HttpResponse::Ok().json(categories)
}

/// `GET /api/map`
pub async fn map(state: web::Data<AppState>, params: web::Query<MapQuery>) -> HttpResponse {
    let strategy = params.strategy();
    let k = match validate_point_limit(params.max_points()) {
        Ok(k) => k,
        Err(e) => return bad_request(&e),
    };

    let result = web::block(move || state.map.create_map_figure(strategy, k)).await;

    match result {
        Ok(Err(e @ MapError::InvalidPointLimit { .. })) => bad_request(&e),
        other => respond("Failed to build crime map", other),
    }
}

/// `GET /api/timeline`
pub async fn timeline(
    state: web::Data<AppState>,
    params: web::Query<TimelineQuery>,
) -> HttpResponse {
    let view = params.view.unwrap_or_default();
    let chart = params.chart_type.unwrap_or_default();

    let result =
        web::block(move || timeline::timeline_figure(state.source.as_ref(), view, chart)).await;
    respond("Failed to build timeline", result)
}

/// `GET /api/temporal/controls`
///
/// Year range and station options for the temporal page filters.
pub async fn temporal_controls(state: web::Data<AppState>) -> HttpResponse {
    let result = web::block(move || temporal::temporal_controls(state.source.as_ref())).await;
    respond("Failed to load temporal controls", result)
}

/// `GET /api/temporal`
///
/// The time of day, day type, and night trend charts for one filter.
pub async fn temporal(
    state: web::Data<AppState>,
    params: web::Query<TemporalQuery>,
) -> HttpResponse {
    let filter = match params.to_filter() {
        Ok(filter) => filter,
        Err(e) => return bad_request(&e),
    };

    let result =
        web::block(move || temporal::temporal_figures(state.source.as_ref(), &filter)).await;
    respond("Failed to build temporal charts", result)
}

/// `GET /api/scatter`
///
/// Always answers with a figure; a failed build becomes the error
/// placeholder figure.
pub async fn scatter(state: web::Data<AppState>) -> HttpResponse {
    match web::block(move || scatter::scatter_figure(state.source.as_ref())).await {
        Ok(result) => HttpResponse::Ok().json(result.into_figure()),
        Err(e) => internal_error("Failed to build scatter plot", &e),
    }
}

/// `GET /api/heatmap`
pub async fn heatmap(state: web::Data<AppState>) -> HttpResponse {
    let result = web::block(move || heatmap::heatmap_figure(state.source.as_ref())).await;
    respond("Failed to build heatmap", result)
}

/// `GET /api/pdq`
///
/// The PDQ dimension table.
pub async fn pdq() -> HttpResponse {
    HttpResponse::Ok().json(reference::pdq_profiles())
}

fn cache_snapshot(state: &AppState) -> CacheStatus {
    CacheStatus {
        data: state.source.cache_info(),
        map_cached: state.map.is_cached(),
    }
}

/// `GET /api/cache`
pub async fn cache_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(cache_snapshot(&state))
}

/// `POST /api/cache/clear`
///
/// Drops the joined map table and memoized filter results. The incident
/// table itself stays loaded.
pub async fn clear_cache(state: web::Data<AppState>) -> HttpResponse {
    state.map.clear_cache();
    HttpResponse::Ok().json(cache_snapshot(&state))
}
