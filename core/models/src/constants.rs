//! Well known identifiers for stages in the provisioning workflow.

/// Terminal sentinel stage: operations at this stage have completed successfully.
pub const STAGE_FINISHED: &str = "Finished";

/// Stage ID for the step that waits for the runtime agent to connect to the control service.
pub const STAGE_WAIT_FOR_AGENT_TO_CONNECT: &str = "WaitForAgentToConnect";
