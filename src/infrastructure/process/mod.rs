mod process_supervisor;

pub use process_supervisor::ProcessSupervisor;
