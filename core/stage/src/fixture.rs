//! Scriptable [`Stage`] implementation for unit tests.
use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;

use provisioner_context::Context;
use provisioner_models::Cluster;
use provisioner_models::Operation;
use provisioner_models::OperationStage;
use provisioner_models::StageResult;

use crate::Stage;

/// Outcome of a [`ScriptedStage`] invocation.
#[derive(Clone, Debug)]
enum Outcome {
    Fail(String),
    Result(StageResult),
}

/// Stage returning scripted outcomes, in order, and a fixed outcome once the script runs out.
///
/// Clones share the script and the invocation counter so tests can observe
/// stages after they are moved into a registry.
#[derive(Clone, Debug)]
pub struct ScriptedStage {
    budget: Duration,
    calls: Arc<AtomicUsize>,
    fallback: Outcome,
    name: OperationStage,
    script: Arc<Mutex<VecDeque<Outcome>>>,
}

impl ScriptedStage {
    /// Stage that always advances to the `next` stage.
    pub fn advance<N1, N2>(name: N1, next: N2) -> ScriptedStage
    where
        N1: Into<OperationStage>,
        N2: Into<OperationStage>,
    {
        let fallback = Outcome::Result(StageResult::advance(next));
        ScriptedStage::new(name.into(), fallback)
    }

    /// Stage that always fails with the given message.
    pub fn failing<N, M>(name: N, message: M) -> ScriptedStage
    where
        N: Into<OperationStage>,
        M: Into<String>,
    {
        let fallback = Outcome::Fail(message.into());
        ScriptedStage::new(name.into(), fallback)
    }

    /// Stage that always waits on itself for the given delay.
    pub fn waiting<N>(name: N, delay: Duration) -> ScriptedStage
    where
        N: Into<OperationStage>,
    {
        let name = name.into();
        let fallback = Outcome::Result(StageResult::wait(name.clone(), delay));
        ScriptedStage::new(name, fallback)
    }

    /// Number of times the stage was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Return the given result from the next unscripted invocation.
    pub fn then(self, result: StageResult) -> ScriptedStage {
        self.access().push_back(Outcome::Result(result));
        self
    }

    /// Fail the next unscripted invocation with the given message.
    pub fn then_fail<M: Into<String>>(self, message: M) -> ScriptedStage {
        self.access().push_back(Outcome::Fail(message.into()));
        self
    }

    /// Change the time budget of the stage (defaults to one minute).
    pub fn with_budget(mut self, budget: Duration) -> ScriptedStage {
        self.budget = budget;
        self
    }

    fn access(&self) -> std::sync::MutexGuard<VecDeque<Outcome>> {
        self.script
            .lock()
            .expect("ScriptedStage::script lock poisoned")
    }

    fn new(name: OperationStage, fallback: Outcome) -> ScriptedStage {
        ScriptedStage {
            budget: Duration::from_secs(60),
            calls: Default::default(),
            fallback,
            name,
            script: Default::default(),
        }
    }
}

#[async_trait::async_trait]
impl Stage for ScriptedStage {
    fn name(&self) -> OperationStage {
        self.name.clone()
    }

    fn time_budget(&self) -> Duration {
        self.budget
    }

    async fn run(&self, _: &Context, _: &Cluster, _: &Operation) -> Result<StageResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .access()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match outcome {
            Outcome::Fail(message) => anyhow::bail!(message),
            Outcome::Result(result) => Ok(result),
        }
    }
}
