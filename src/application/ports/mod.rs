mod job_store;
mod media_tool;
mod process_runner;
mod scratch_storage;

pub use job_store::{JobStore, JobStoreError, JobUpdate, job_update};
pub use media_tool::{MediaTool, ToolComponents};
pub use process_runner::{
    CommandSpec, LineSink, OutputLine, OutputStream, ProcessError, ProcessOutput, ProcessRunner,
    RunOptions,
};
pub use scratch_storage::{ScratchError, ScratchStorage};
