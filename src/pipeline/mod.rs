pub mod cancel;
pub mod job;
pub mod job_runner;
pub mod orchestrator;
pub mod slot;
pub mod workspace;
