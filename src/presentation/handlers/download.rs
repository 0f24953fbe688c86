use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::error_response::{error_response, parse_job_id};
use crate::application::services::{Delivery, DeliveryError};
use crate::presentation::state::AppState;

pub const TRACK_TITLE_HEADER: &str = "x-track-title";
pub const TRACK_ARTIST_HEADER: &str = "x-track-artist";
pub const TRACK_DURATION_HEADER: &str = "x-track-duration";

const MAX_HEADER_NAME_CHARS: usize = 200;
const UNSAFE_FILENAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Streams a completed job once. The job and its files are gone afterwards.
#[tracing::instrument(skip(state))]
pub async fn download_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.delivery_service.claim(id).await {
        Ok(delivery) => delivery_response(delivery),
        Err(DeliveryError::NotFound(_)) => error_response(
            StatusCode::NOT_FOUND,
            format!("Job not found: {}", job_id),
        ),
        Err(e @ DeliveryError::NotReady { .. }) => {
            error_response(StatusCode::CONFLICT, e.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to start download");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Download failed: {}", e),
            )
        }
    }
}

fn delivery_response(delivery: Delivery) -> Response {
    let title = encode_header_text(&delivery.metadata.title);
    let artist = encode_header_text(&delivery.metadata.artist);
    let disposition = format!("attachment; filename=\"{}.mp3\"", title);

    let mut response = Body::from_stream(delivery.body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(delivery.file_size));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(
        TRACK_DURATION_HEADER,
        HeaderValue::from(delivery.metadata.duration_secs),
    );
    if let Ok(value) = HeaderValue::from_str(&title) {
        headers.insert(TRACK_TITLE_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&artist) {
        headers.insert(TRACK_ARTIST_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// Replaces filesystem-unsafe characters, caps the length and percent-encodes the rest.
pub fn encode_header_text(text: &str) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_HEADER_NAME_CHARS)
        .collect();
    urlencoding::encode(&sanitized).into_owned()
}
