//! Stages are the units of work provisioning operations are made of.
mod registry;
mod stage;

pub mod errors;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::ScriptedStage;

pub use self::registry::StageRegistry;
pub use self::registry::StageRegistryBuilder;
pub use self::stage::Stage;
