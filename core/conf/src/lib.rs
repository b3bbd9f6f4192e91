//! Provisioner configuration object and helpers.
mod loading;
mod object;

pub mod logging;

pub use self::loading::load;
pub use self::loading::Error;
pub use self::logging::LoggingConf;
pub use self::logging::LoggingLevel;
pub use self::object::Conf;
pub use self::object::OrchestratorConf;
pub use self::object::StagesConf;
pub use self::object::WaitForAgentConf;
