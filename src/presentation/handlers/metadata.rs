use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::error_response::error_response;
use crate::application::services::MetadataError;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    pub url: String,
}

#[tracing::instrument(skip(state))]
pub async fn metadata_handler(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> impl IntoResponse {
    match state.metadata_service.lookup(&query.url).await {
        Ok(info) => (StatusCode::OK, Json(info)).into_response(),
        Err(MetadataError::InvalidInput(_)) => error_response(
            StatusCode::BAD_REQUEST,
            "Invalid YouTube URL. Supported: youtube.com, youtu.be, music.youtube.com",
        ),
        Err(e @ MetadataError::ToolFailure(_)) => {
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
        Err(MetadataError::TimedOut(_)) => {
            error_response(StatusCode::GATEWAY_TIMEOUT, "Request timed out")
        }
        Err(e) => {
            tracing::error!(error = %e, url = %query.url, "Unexpected error fetching metadata");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Server error: {}", e),
            )
        }
    }
}
