//! Collection of stage implementations known to the orchestrator.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use provisioner_models::OperationStage;

use crate::Stage;

/// Collection of [`Stage`]s the orchestrator can invoke, indexed by name.
#[derive(Clone, Debug)]
pub struct StageRegistry {
    /// Map of stage identifiers to stage implementations.
    entries: Arc<HashMap<OperationStage, Box<dyn Stage>>>,
}

impl StageRegistry {
    /// Begin building an empty [`StageRegistry`] instance.
    pub fn build() -> StageRegistryBuilder {
        StageRegistryBuilder::default()
    }

    /// Lookup the implementation for a stage.
    pub fn lookup(&self, stage: &OperationStage) -> Result<&dyn Stage> {
        self.entries
            .get(stage)
            .map(|stage| &**stage)
            .ok_or(crate::errors::StageNotRegistered::from(stage.as_str()))
            .map_err(anyhow::Error::from)
    }

    /// Number of stages in the registry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry has no stages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Incrementally build [`StageRegistry`]s.
#[derive(Debug, Default)]
pub struct StageRegistryBuilder {
    entries: HashMap<OperationStage, Box<dyn Stage>>,
}

impl StageRegistryBuilder {
    /// Complete building the registry instance.
    pub fn finish(self) -> StageRegistry {
        StageRegistry {
            entries: Arc::new(self.entries),
        }
    }

    /// Register a new stage implementation.
    ///
    /// # Panics
    ///
    /// This method panics if a stage with the same name is already registered
    /// or if the stage claims the terminal [`OperationStage::finished`] name.
    pub fn register<S>(&mut self, stage: S) -> &mut Self
    where
        S: Stage + 'static,
    {
        let name = stage.name();
        if name.is_finished() {
            panic!("stage {} is the terminal sentinel and cannot be registered", name);
        }
        if self.entries.contains_key(&name) {
            panic!("stage {} cannot be registered more then once", name);
        }
        self.entries.insert(name, Box::new(stage));
        self
    }
}
