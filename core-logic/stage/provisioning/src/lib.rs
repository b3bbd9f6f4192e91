//! Stages of the cluster provisioning workflow.
//!
//! Stages in this crate are constructed with all the external capabilities they need
//! so processes decide which implementations to use when building the [`StageRegistry`].
//!
//! [`StageRegistry`]: provisioner_stage::StageRegistry
mod wait_for_agent;

pub mod errors;

pub use self::wait_for_agent::WaitForAgentToConnect;

#[cfg(test)]
mod tests;
