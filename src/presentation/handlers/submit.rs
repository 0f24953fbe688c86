use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use super::error_response::error_response;
use crate::application::services::ConversionError;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub url: String,
    #[serde(default)]
    pub quality: Option<QualitySelector>,
}

/// Accepts both `"192"` and `192`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QualitySelector {
    Text(String),
    Number(u64),
}

impl QualitySelector {
    fn as_selector(&self) -> String {
        match self {
            QualitySelector::Text(text) => text.clone(),
            QualitySelector::Number(n) => n.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: String,
    pub quality: u32,
    pub message: String,
}

#[tracing::instrument(skip(state, request), fields(url = %request.url))]
pub async fn submit_handler(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> impl IntoResponse {
    let selector = request.quality.as_ref().map(QualitySelector::as_selector);

    match state
        .conversion_service
        .submit(&request.url, selector.as_deref())
        .await
    {
        Ok(submission) => {
            let job = submission.job;
            (
                StatusCode::ACCEPTED,
                Json(SubmitResponse {
                    job_id: job.id.to_string(),
                    status: job.status().as_str().to_string(),
                    quality: job.request.quality.kbps(),
                    message: "Conversion started".to_string(),
                }),
            )
                .into_response()
        }
        Err(ConversionError::InvalidInput(e)) => {
            tracing::warn!(error = %e, "Rejected submission");
            error_response(StatusCode::BAD_REQUEST, format!("Invalid YouTube URL: {}", e))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create job");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to create job: {}", e),
            )
        }
    }
}
