//! Dashboard read API: the ranked result matrix and ingestion freshness.

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{Config, defaults};
use crate::error::{AppError, AppResult};
use crate::models::ResultMatrix;
use crate::services::Aggregator;
use crate::store::TrackerStore;

/// Query parameters for the matrix endpoint.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MatrixQuery {
    /// Number of most recent builds to include.
    #[serde(default)]
    pub window: Option<usize>,
}

/// Time of the last completed ingestion batch.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LastUpdatedResponse {
    /// RFC 3339 timestamp
    pub last_updated: Option<String>,
    /// Seconds since the Unix epoch
    pub last_updated_unix: Option<i64>,
}

/// Validate a requested window, falling back to the configured default.
fn resolve_window(requested: Option<usize>, default_window: usize) -> AppResult<usize> {
    let window = requested.unwrap_or(default_window);
    if window == 0 || window > defaults::MAX_WINDOW_SIZE {
        return Err(AppError::InvalidInput(format!(
            "window must be between 1 and {}",
            defaults::MAX_WINDOW_SIZE
        )));
    }
    Ok(window)
}

/// Ranked test-by-build matrix for the most recent builds.
#[utoipa::path(
    get,
    path = "/api/v1/matrix",
    tag = "Dashboard",
    params(
        ("window" = Option<usize>, Query, description = "Builds to include (default 10, max 100)")
    ),
    responses(
        (status = 200, description = "Ranked result matrix", body = ResultMatrix),
        (status = 400, description = "Invalid window", body = crate::error::ErrorResponse),
        (status = 503, description = "Nothing ingested yet", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_matrix(
    aggregator: web::Data<Aggregator>,
    config: web::Data<Config>,
    query: web::Query<MatrixQuery>,
) -> AppResult<HttpResponse> {
    let window = resolve_window(query.window, config.tracker.window_size)?;
    let matrix = aggregator.aggregate(window).await?;
    Ok(HttpResponse::Ok().json(matrix))
}

/// Time of the last completed ingestion batch.
#[utoipa::path(
    get,
    path = "/api/v1/last-updated",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Last ingestion time", body = LastUpdatedResponse),
        (status = 404, description = "Ingestion has never completed", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_last_updated(store: web::Data<TrackerStore>) -> AppResult<HttpResponse> {
    let last = store.last_updated().await?;
    if last.text.is_none() && last.unix.is_none() {
        return Err(AppError::NotFound("Ingestion timestamp".to_string()));
    }
    Ok(HttpResponse::Ok().json(LastUpdatedResponse {
        last_updated: last.text,
        last_updated_unix: last.unix,
    }))
}

/// Configure dashboard routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/matrix").route(web::get().to(get_matrix)))
        .service(web::resource("/last-updated").route(web::get().to(get_last_updated)));
}
