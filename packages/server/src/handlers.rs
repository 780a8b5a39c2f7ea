//! HTTP handler functions for the crash map API.

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, web};
use crash_map_analytics::{AnalyticsError, RankingRequest, filter, rank_crashes};
use crash_map_analytics_models::FilterParams;
use crash_map_heatmap::{render_error, render_heatmap, select_points};
use crash_map_server_models::{
    ApiError, ApiHealth, ApiStatus, ColumnsResponse, DEFAULT_SAMPLE_LIMIT, MapQueryParams,
    RankingQueryParams, SampleQueryParams, SampleResponse,
};

use crate::AppState;

/// `GET /`
pub async fn status() -> HttpResponse {
    HttpResponse::Ok().json(ApiStatus {
        status: "API is running".to_string(),
    })
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/map`
///
/// Renders the filtered crashes as a Leaflet heatmap page.
pub async fn map(state: web::Data<AppState>, params: web::Query<MapQueryParams>) -> HttpResponse {
    let filters = FilterParams::from(&*params);

    let crash_filter = match filter::parse_filter(&filters) {
        Ok(f) => f,
        Err(e) => {
            log::warn!("Rejected map request: {e}");
            return HttpResponse::BadRequest()
                .content_type(ContentType::html())
                .body(render_error(&e.to_string()));
        }
    };

    let selected = filter::apply_filter(&state.dataset, &crash_filter);
    let points = select_points(&selected, state.config.heatmap);
    log::debug!(
        "Map request matched {} crashes, drawing {} points",
        selected.len(),
        points.len()
    );

    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(render_heatmap(&points))
}

/// `GET /api/ranking`
///
/// Ranks streets or spatial bins among the filtered crashes.
pub async fn ranking(
    state: web::Data<AppState>,
    params: web::Query<RankingQueryParams>,
) -> HttpResponse {
    let request = RankingRequest {
        filters: FilterParams::from(&*params),
        rank_type: params.rank_type().to_string(),
        group_by: params.group_by().to_string(),
        limit: params.limit.unwrap_or(state.config.ranking.default_limit),
    };

    match rank_crashes(
        &state.dataset,
        &request,
        state.config.ranking.default_period(),
    ) {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e @ AnalyticsError::InvalidDate { .. }) => {
            log::warn!("Rejected ranking request: {e}");
            HttpResponse::BadRequest().json(ApiError::new(e))
        }
    }
}

/// `GET /api/data/sample`
///
/// Returns the first rows of the dataset as JSON objects.
pub async fn sample(
    state: web::Data<AppState>,
    params: web::Query<SampleQueryParams>,
) -> HttpResponse {
    let limit = params.limit.unwrap_or(DEFAULT_SAMPLE_LIMIT);
    HttpResponse::Ok().json(SampleResponse {
        data: state.dataset.sample(limit),
    })
}

/// `GET /api/columns`
pub async fn columns(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ColumnsResponse {
        columns: state.dataset.columns().to_vec(),
    })
}

/// Converts query-string deserialization failures into the standard error
/// body.
pub fn query_error(
    err: actix_web::error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ApiError::new(&err));
    actix_web::error::InternalError::from_response(err, response).into()
}

/// Converts query-string deserialization failures on the map endpoint into
/// the HTML error page.
pub fn map_query_error(
    err: actix_web::error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    log::warn!("Rejected map request: {err}");
    let response = HttpResponse::BadRequest()
        .content_type(ContentType::html())
        .body(render_error(&err.to_string()));
    actix_web::error::InternalError::from_response(err, response).into()
}
