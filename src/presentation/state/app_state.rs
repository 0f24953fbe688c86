use std::sync::Arc;

use crate::application::ports::{JobStore, MediaTool, ProcessRunner, ScratchStorage};
use crate::application::services::{
    ConcurrencyGate, ConversionRunner, ConversionService, DeliveryService, ExpirySweeper,
    HealthService, MetadataService, RunnerConfig,
};
use crate::presentation::config::JobSettings;

/// The adapters every service is built from. One set per service instance.
#[derive(Clone)]
pub struct Dependencies {
    pub job_store: Arc<dyn JobStore>,
    pub process_runner: Arc<dyn ProcessRunner>,
    pub media_tool: Arc<dyn MediaTool>,
    pub scratch: Arc<dyn ScratchStorage>,
}

#[derive(Clone)]
pub struct AppState {
    pub conversion_service: Arc<ConversionService>,
    pub delivery_service: Arc<DeliveryService>,
    pub metadata_service: Arc<MetadataService>,
    pub health_service: Arc<HealthService>,
}

impl AppState {
    /// Wires the services around `deps` and returns the sweeper for the caller to run.
    pub fn assemble(
        deps: Dependencies,
        jobs: &JobSettings,
        stream_progress: bool,
    ) -> (Self, ExpirySweeper) {
        let gate = ConcurrencyGate::new(jobs.metadata_slots, jobs.conversion_slots);

        let sweeper = ExpirySweeper::new(
            Arc::clone(&deps.job_store),
            Arc::clone(&deps.scratch),
            jobs.ttl(),
            jobs.sweep_interval(),
        );

        let runner = Arc::new(ConversionRunner::new(
            Arc::clone(&deps.job_store),
            gate.clone(),
            Arc::clone(&deps.process_runner),
            Arc::clone(&deps.media_tool),
            Arc::clone(&deps.scratch),
            RunnerConfig {
                conversion_timeout: jobs.conversion_timeout(),
                stream_progress,
            },
        ));

        let conversion_service = Arc::new(ConversionService::new(
            Arc::clone(&deps.job_store),
            runner,
            sweeper.clone(),
        ));

        let delivery_service = Arc::new(DeliveryService::new(
            Arc::clone(&deps.job_store),
            Arc::clone(&deps.scratch),
            jobs.chunk_size,
        ));

        let metadata_service = Arc::new(MetadataService::new(
            gate,
            Arc::clone(&deps.process_runner),
            Arc::clone(&deps.media_tool),
            jobs.metadata_timeout(),
        ));

        let health_service = Arc::new(HealthService::new(
            Arc::clone(&deps.job_store),
            Arc::clone(&deps.media_tool),
        ));

        let state = Self {
            conversion_service,
            delivery_service,
            metadata_service,
            health_service,
        };
        (state, sweeper)
    }
}
