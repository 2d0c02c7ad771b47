pub mod cli;
pub mod config;
pub mod orchestrator;
pub mod report;
pub mod submit;
pub mod telemetry;
pub mod validate;
