mod download;
mod error_response;
mod health;
mod index;
mod job_status;
mod metadata;
mod submit;

pub use download::{
    TRACK_ARTIST_HEADER, TRACK_DURATION_HEADER, TRACK_TITLE_HEADER, download_handler,
    encode_header_text,
};
pub use error_response::ErrorResponse;
pub use health::health_handler;
pub use index::index_handler;
pub use job_status::{JobStatusResponse, job_status_handler};
pub use metadata::metadata_handler;
pub use submit::{SubmitRequest, SubmitResponse, submit_handler};
