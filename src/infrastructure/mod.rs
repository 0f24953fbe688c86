pub mod media_tool;
pub mod observability;
pub mod persistence;
pub mod process;
pub mod storage;
