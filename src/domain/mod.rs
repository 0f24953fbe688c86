mod audio_quality;
mod conversion_output;
mod conversion_request;
mod job;
mod job_failure;
mod job_id;
mod job_status;
mod source_url;
mod track_metadata;

pub use audio_quality::AudioQuality;
pub use conversion_output::ConversionOutput;
pub use conversion_request::ConversionRequest;
pub use job::{Job, JobState, JobTransitionError};
pub use job_failure::{JobFailure, MAX_DIAGNOSTIC_CHARS, tail_chars};
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use source_url::{SourceUrl, SourceUrlError};
pub use track_metadata::{MediaInfo, TrackMetadata, UNKNOWN_FIELD};
