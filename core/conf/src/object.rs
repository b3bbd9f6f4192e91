//! Data object storing the provisioner's configuration.
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use provisioner_retry::RetryConf;

use crate::LoggingConf;

/// Global configuration for the provisioner process.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conf {
    /// Process logging configuration.
    #[serde(default)]
    pub logging: LoggingConf,

    /// Operations orchestration configuration.
    #[serde(default)]
    pub orchestrator: OrchestratorConf,

    /// Per-stage configuration.
    #[serde(default)]
    pub stages: StagesConf,
}

/// Configuration of the operations executor.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConf {
    /// Maximum number of operations driven at the same time.
    #[serde(default = "OrchestratorConf::default_concurrent_operations")]
    pub concurrent_operations: usize,

    /// Resume in-progress operations found in the store when the executor starts.
    #[serde(default = "OrchestratorConf::default_resume_on_start")]
    pub resume_on_start: bool,

    /// Delay, in seconds, before operations that could not be progressed are driven again.
    #[serde(default = "OrchestratorConf::default_retry_delay")]
    pub retry_delay: u64,
}

impl Default for OrchestratorConf {
    fn default() -> Self {
        OrchestratorConf {
            concurrent_operations: Self::default_concurrent_operations(),
            resume_on_start: Self::default_resume_on_start(),
            retry_delay: Self::default_retry_delay(),
        }
    }
}

impl OrchestratorConf {
    fn default_concurrent_operations() -> usize {
        let parallelism = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(1);
        parallelism * 2
    }

    fn default_resume_on_start() -> bool {
        true
    }

    fn default_retry_delay() -> u64 {
        5
    }

    /// [`Duration`] version of `retry_delay`.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }
}

/// Configuration of individual provisioning stages.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StagesConf {
    #[serde(default)]
    pub wait_for_agent_to_connect: WaitForAgentConf,
}

/// Configuration of the stage waiting for the runtime agent to connect.
///
/// All delays are in seconds.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WaitForAgentConf {
    /// Delay before checking again when the connection status resource does not exist yet.
    #[serde(default = "WaitForAgentConf::default_not_found_delay")]
    pub not_found_delay: u64,

    /// Delay before checking again while the connection is still in progress.
    ///
    /// Also used to re-attempt failed reports to the directory service.
    #[serde(default = "WaitForAgentConf::default_pending_delay")]
    pub pending_delay: u64,

    /// Delay before checking again after the runtime configuration was re-applied.
    #[serde(default = "WaitForAgentConf::default_reconfigure_delay")]
    pub reconfigure_delay: u64,

    /// Retry policy for reporting the runtime as connected to the directory service.
    #[serde(default)]
    pub report_retry: RetryConf,

    /// Maximum time the stage can spend waiting for the agent.
    #[serde(default = "WaitForAgentConf::default_time_budget")]
    pub time_budget: u64,
}

impl Default for WaitForAgentConf {
    fn default() -> Self {
        WaitForAgentConf {
            not_found_delay: Self::default_not_found_delay(),
            pending_delay: Self::default_pending_delay(),
            reconfigure_delay: Self::default_reconfigure_delay(),
            report_retry: RetryConf::default(),
            time_budget: Self::default_time_budget(),
        }
    }
}

impl WaitForAgentConf {
    fn default_not_found_delay() -> u64 {
        5
    }

    fn default_pending_delay() -> u64 {
        2
    }

    fn default_reconfigure_delay() -> u64 {
        2 * 60
    }

    fn default_time_budget() -> u64 {
        15 * 60
    }

    /// [`Duration`] version of `not_found_delay`.
    pub fn not_found_delay(&self) -> Duration {
        Duration::from_secs(self.not_found_delay)
    }

    /// [`Duration`] version of `pending_delay`.
    pub fn pending_delay(&self) -> Duration {
        Duration::from_secs(self.pending_delay)
    }

    /// [`Duration`] version of `reconfigure_delay`.
    pub fn reconfigure_delay(&self) -> Duration {
        Duration::from_secs(self.reconfigure_delay)
    }

    /// [`Duration`] version of `time_budget`.
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget)
    }
}
