use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use super::error_response::{error_response, parse_job_id};
use crate::application::services::ConversionError;
use crate::domain::{Job, JobState};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub id: String,
    pub status: String,
    pub progress: String,
    pub quality: u32,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_placeholder: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        let mut response = JobStatusResponse {
            id: job.id.to_string(),
            status: job.status().as_str().to_string(),
            progress: job.progress.clone(),
            quality: job.request.quality.kbps(),
            created_at: job.created_at.to_rfc3339(),
            title: None,
            artist: None,
            duration: None,
            file_size: None,
            metadata_placeholder: None,
            error: None,
            error_kind: None,
        };
        match job.state() {
            JobState::Completed(output) => {
                response.title = Some(output.metadata.title.clone());
                response.artist = Some(output.metadata.artist.clone());
                response.duration = Some(output.metadata.duration_secs);
                response.file_size = Some(output.file_size);
                response.metadata_placeholder = Some(output.metadata_placeholder);
            }
            JobState::Failed(failure) => {
                response.error = Some(failure.to_string());
                response.error_kind = Some(failure.kind().to_string());
            }
            JobState::Pending | JobState::Processing => {}
        }
        response
    }
}

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.conversion_service.status(id).await {
        Ok(job) => (StatusCode::OK, Json(JobStatusResponse::from(&job))).into_response(),
        Err(ConversionError::NotFound(_)) => error_response(
            StatusCode::NOT_FOUND,
            format!("Job not found: {}", job_id),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch job status");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch job: {}", e),
            )
        }
    }
}
