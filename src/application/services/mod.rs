mod concurrency_gate;
mod conversion_runner;
mod conversion_service;
mod delivery_service;
mod expiry_sweeper;
mod health_service;
mod metadata_service;

pub use concurrency_gate::{
    ConcurrencyGate, DEFAULT_CONVERSION_SLOTS, DEFAULT_METADATA_SLOTS, GateClosed, GatePermit,
    ResourceClass,
};
pub use conversion_runner::{
    ConversionRunner, DEFAULT_CONVERSION_TIMEOUT, JobHandle, RunnerConfig, RunnerError,
};
pub use conversion_service::{ConversionError, ConversionService, Submission};
pub use delivery_service::{
    DEFAULT_CHUNK_SIZE, Delivery, DeliveryError, DeliveryService, DeliveryStream,
};
pub use expiry_sweeper::{DEFAULT_JOB_TTL, DEFAULT_SWEEP_INTERVAL, ExpirySweeper};
pub use health_service::{HealthReport, HealthService};
pub use metadata_service::{DEFAULT_METADATA_TIMEOUT, MetadataError, MetadataService};
