use axum::Json;
use serde_json::{Value, json};

pub async fn index_handler() -> Json<Value> {
    Json(json!({
        "name": "tonearm",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /health": "Health check",
            "GET /api/v1/metadata?url=": "Get video metadata without downloading",
            "POST /api/v1/jobs": "Submit a conversion job",
            "GET /api/v1/jobs/{job_id}": "Poll job status",
            "GET /api/v1/jobs/{job_id}/download": "Download a completed job (single use)"
        }
    }))
}
