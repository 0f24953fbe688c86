use std::sync::Arc;

use serde::Serialize;

use crate::application::ports::{JobStore, MediaTool, ToolComponents};

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub active_jobs: usize,
    #[serde(flatten)]
    pub components: ToolComponents,
}

/// Read-only view of the service: in-flight jobs and what the tool has available.
pub struct HealthService {
    job_store: Arc<dyn JobStore>,
    media_tool: Arc<dyn MediaTool>,
}

impl HealthService {
    pub fn new(job_store: Arc<dyn JobStore>, media_tool: Arc<dyn MediaTool>) -> Self {
        Self {
            job_store,
            media_tool,
        }
    }

    pub async fn report(&self) -> HealthReport {
        let active_jobs = self
            .job_store
            .list()
            .await
            .iter()
            .filter(|job| !job.status().is_terminal())
            .count();

        // PATH scans and file stats block.
        let media_tool = Arc::clone(&self.media_tool);
        let components = match tokio::task::spawn_blocking(move || media_tool.components()).await
        {
            Ok(components) => components,
            Err(e) => {
                tracing::warn!(error = %e, "Tool component lookup failed");
                ToolComponents::default()
            }
        };

        HealthReport {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            active_jobs,
            components,
        }
    }
}
