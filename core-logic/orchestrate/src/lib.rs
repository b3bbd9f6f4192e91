//! Drive provisioning operations through their stages.
//!
//! The [`Orchestrator`] implements a single wake-up of an operation:
//! the current stage is looked up, its time budget enforced, and the stage invoked
//! with the result persisted so operations can be resumed at any time.
//!
//! The [`OperationsExecutor`] drives many operations concurrently, sleeping
//! between wake-ups as instructed by the stages.
mod executor;
mod orchestrator;
mod telemetry;

pub mod errors;

pub use self::executor::OperationsExecutor;
pub use self::executor::OperationsSubmitter;
pub use self::orchestrator::Orchestrator;
pub use self::telemetry::register_metrics;

#[cfg(test)]
mod tests;
