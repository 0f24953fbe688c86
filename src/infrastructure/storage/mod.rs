mod local_scratch;

pub use local_scratch::LocalScratchStorage;
