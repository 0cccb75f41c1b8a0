//! HTTP handler functions for the crime spotter API.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use chrono::Local;
use crime_spotter_analytics::AnalyticsError;
use crime_spotter_analytics::risk::assess_risk;
use crime_spotter_analytics::routes::route_safety;
use crime_spotter_analytics::stats::dashboard_stats;
use crime_spotter_analytics::suggestions::{DEFAULT_SUGGESTION_LIMIT, suggest_locations};
use crime_spotter_analytics::temporal::analyze_trends;
use crime_spotter_incident_models::IncidentBatch;
use crime_spotter_server_models::{
    ApiError, ApiHealth, ApiIncidentPage, ClusterQueryParams, DEFAULT_INCIDENT_LIMIT,
    IncidentQueryParams, RiskQueryParams, RouteQueryParams, StatsQueryParams,
    SuggestionQueryParams, TrendQueryParams,
};
use crime_spotter_spatial::render::clusters_to_geojson;
use crime_spotter_spatial::{Cluster, SpatialClusterer};

use crate::AppState;

/// The batch to serve, or a `503` if no poll has succeeded yet.
fn current_batch(state: &AppState) -> Result<Arc<IncidentBatch>, HttpResponse> {
    let snapshot = state.snapshot.borrow();
    snapshot.batch.clone().ok_or_else(|| {
        let message = snapshot.last_error.as_ref().map_or_else(
            || "No incident data has been loaded yet".to_string(),
            |e| format!("No incident data has been loaded yet: {e}"),
        );
        HttpResponse::ServiceUnavailable().json(ApiError::new(message))
    })
}

fn bad_request(error: &AnalyticsError) -> HttpResponse {
    log::debug!("Rejected request: {error}");
    HttpResponse::BadRequest().json(ApiError::new(error.to_string()))
}

fn cluster(state: &AppState, params: &ClusterQueryParams) -> Result<Vec<Cluster>, HttpResponse> {
    let radius = params.radius.unwrap_or(state.cluster_radius);
    if !(radius.is_finite() && radius > 0.0) {
        return Err(HttpResponse::BadRequest().json(ApiError::new(
            "radius must be a positive number of degrees",
        )));
    }
    let batch = current_batch(state)?;
    Ok(SpatialClusterer::new(radius).cluster(batch.spatial()))
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.snapshot.borrow().clone();
    HttpResponse::Ok().json(ApiHealth {
        healthy: snapshot.batch.is_some(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        incident_count: snapshot.batch.as_ref().map_or(0, |b| b.len()),
        generation: snapshot.generation,
        last_poll_at: snapshot.last_attempt_at,
        stale: snapshot.is_stale(),
        last_error: snapshot.last_error,
    })
}

/// `GET /api/incidents`
///
/// Pages through the current batch in feed order, or newest first.
pub async fn incidents(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let batch = match current_batch(&state) {
        Ok(batch) => batch,
        Err(response) => return response,
    };

    let limit = params.limit.unwrap_or(DEFAULT_INCIDENT_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let ordered = if params.newest_first.unwrap_or(false) {
        batch.newest_first()
    } else {
        batch.incidents.iter().collect()
    };

    HttpResponse::Ok().json(ApiIncidentPage {
        total: batch.len(),
        offset,
        limit,
        incidents: ordered
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect(),
    })
}

/// `GET /api/clusters`
pub async fn clusters(
    state: web::Data<AppState>,
    params: web::Query<ClusterQueryParams>,
) -> HttpResponse {
    match cluster(&state, &params) {
        Ok(clusters) => HttpResponse::Ok().json(clusters),
        Err(response) => response,
    }
}

/// `GET /api/clusters/geojson`
///
/// Same clusters as `/api/clusters`, as a GeoJSON `FeatureCollection`.
pub async fn clusters_geojson(
    state: web::Data<AppState>,
    params: web::Query<ClusterQueryParams>,
) -> HttpResponse {
    match cluster(&state, &params) {
        Ok(clusters) => HttpResponse::Ok()
            .content_type("application/geo+json")
            .body(clusters_to_geojson(&clusters).to_string()),
        Err(response) => response,
    }
}

/// `GET /api/trends`
pub async fn trends(
    state: web::Data<AppState>,
    params: web::Query<TrendQueryParams>,
) -> HttpResponse {
    match current_batch(&state) {
        Ok(batch) => HttpResponse::Ok().json(analyze_trends(
            &batch.incidents,
            params.granularity.unwrap_or_default(),
            &Local::now(),
        )),
        Err(response) => response,
    }
}

/// `GET /api/risk`
pub async fn risk(state: web::Data<AppState>, params: web::Query<RiskQueryParams>) -> HttpResponse {
    let batch = match current_batch(&state) {
        Ok(batch) => batch,
        Err(response) => return response,
    };

    let location = params.location.as_deref().unwrap_or_default();
    match assess_risk(&batch.incidents, location, &Local::now()) {
        Ok(assessment) => HttpResponse::Ok().json(assessment),
        Err(e) => bad_request(&e),
    }
}

/// `GET /api/routes`
pub async fn routes(
    state: web::Data<AppState>,
    params: web::Query<RouteQueryParams>,
) -> HttpResponse {
    let batch = match current_batch(&state) {
        Ok(batch) => batch,
        Err(response) => return response,
    };

    let start = params.start.as_deref().unwrap_or_default();
    let end = params.end.as_deref().unwrap_or_default();
    match route_safety(&batch.incidents, start, end) {
        Ok(safety) => HttpResponse::Ok().json(safety),
        Err(e) => bad_request(&e),
    }
}

/// `GET /api/stats`
pub async fn stats(
    state: web::Data<AppState>,
    params: web::Query<StatsQueryParams>,
) -> HttpResponse {
    match current_batch(&state) {
        Ok(batch) => HttpResponse::Ok().json(dashboard_stats(
            &batch.incidents,
            params.range.unwrap_or_default(),
            &Local::now(),
        )),
        Err(response) => response,
    }
}

/// `GET /api/suggestions`
pub async fn suggestions(
    state: web::Data<AppState>,
    params: web::Query<SuggestionQueryParams>,
) -> HttpResponse {
    match current_batch(&state) {
        Ok(batch) => HttpResponse::Ok().json(suggest_locations(
            &batch.incidents,
            params.q.as_deref().unwrap_or_default(),
            params.limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT),
        )),
        Err(response) => response,
    }
}

/// `GET /api/alerts`
///
/// Recent alerts, newest first. Served even before the first batch.
pub async fn alerts(state: web::Data<AppState>) -> HttpResponse {
    let recent = state.alerts.lock().await.recent();
    HttpResponse::Ok().json(recent)
}
