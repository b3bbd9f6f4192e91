//! Directory service client that records requests for unit tests.
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Result;

use provisioner_context::Context;
use provisioner_models::RuntimeStatusCondition;

use crate::DirectorBackend;

/// Record of a runtime status update request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusUpdate {
    pub condition: RuntimeStatusCondition,
    pub runtime_id: String,
    pub tenant: String,
}

/// In-memory directory service that can fail a set number of requests.
#[derive(Clone, Default)]
pub struct DirectorFixture {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    failures: Option<usize>,
    requests: Vec<StatusUpdate>,
}

impl DirectorFixture {
    /// Directory that fails the next `count` requests.
    pub fn failing(count: usize) -> DirectorFixture {
        let fixture = DirectorFixture::default();
        fixture.access().failures = Some(count);
        fixture
    }

    /// Directory that fails every request.
    pub fn unavailable() -> DirectorFixture {
        let fixture = DirectorFixture::default();
        fixture.access().failures = Some(usize::MAX);
        fixture
    }

    /// All requests received by the directory, including failed ones.
    pub fn requests(&self) -> Vec<StatusUpdate> {
        self.access().requests.clone()
    }

    fn access(&self) -> std::sync::MutexGuard<State> {
        self.state.lock().expect("DirectorFixture state lock poisoned")
    }
}

#[async_trait::async_trait]
impl DirectorBackend for DirectorFixture {
    async fn set_runtime_status_condition(
        &self,
        _: &Context,
        runtime_id: &str,
        condition: RuntimeStatusCondition,
        tenant: &str,
    ) -> Result<()> {
        let mut state = self.access();
        state.requests.push(StatusUpdate {
            condition,
            runtime_id: runtime_id.to_string(),
            tenant: tenant.to_string(),
        });
        match state.failures {
            Some(0) | None => Ok(()),
            Some(count) => {
                state.failures = Some(count.saturating_sub(1));
                anyhow::bail!("directory service unavailable")
            }
        }
    }
}
