//! Interfaces to reach provisioned clusters and the resources in them.
//!
//! Transport implementations live outside of the provisioning engine:
//! stages interact with clusters through the traits defined here and are handed
//! the implementations (or factories for them) when they are created.
mod config;
mod configurator;
mod status;

pub mod errors;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::ConnectionStatusFixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::RuntimeConfiguratorFixture;

pub use self::config::ClusterAuth;
pub use self::config::ClusterConfig;
pub use self::configurator::ArcedRuntimeConfigurator;
pub use self::configurator::RuntimeConfigurator;
pub use self::status::ArcedConnectionStatusFactory;
pub use self::status::ConnectionState;
pub use self::status::ConnectionStatus;
pub use self::status::ConnectionStatusBackend;
pub use self::status::ConnectionStatusClient;
pub use self::status::ConnectionStatusFactory;

/// Name of the connection status resource the runtime agent maintains on the cluster.
pub const DEFAULT_CONNECTION_NAME: &str = "compass-connection";
