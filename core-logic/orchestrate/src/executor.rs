//! Drive many operations concurrently.
use std::any::Any;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::future::Future;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::future::FutureExt;
use futures::stream::FuturesUnordered;
use futures::stream::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use replisdk::utils::error::slog::ErrorAttributes;

use provisioner_conf::OrchestratorConf;
use provisioner_context::Context;
use provisioner_errors::is_caused_by;
use provisioner_errors::OperationNotFound;
use provisioner_models::Operation;
use provisioner_store::query::ListOperationsInProgress;

use crate::errors::ExecutorStopped;
use crate::Orchestrator;

type DriveResult = (Uuid, Result<Operation>);

/// Drive operations to completion, concurrently, as they are submitted.
///
/// Each operation is driven in its own [`tokio::spawn`]ed task with the
/// [`Orchestrator::drive`] loop, so waiting operations do not hold up others.
///
/// ## Capacity
///
/// The number of operations driven at the same time is limited by configuration.
/// Operations submitted once the limit is reached are queued until capacity frees up.
/// Operations submitted while they are queued or driven are ignored, ensuring
/// the same operation is never progressed concurrently.
///
/// ## Driver Errors
///
/// Drivers fail when operations can't be progressed (for example the store is unavailable).
/// In that case the operation record is unchanged and the operation is queued again
/// after the configured retry delay. Operations that no longer exist are dropped.
///
/// ## Executor Shutdown
///
/// A process shutdown notification can be received by resolving a unit [`Future`].
/// When the exit future resolves the executor stops driving operations and aborts
/// all in-progress drivers. Operations are persisted after every stage invocation
/// so they can be resumed from their last stage by the next executor.
pub struct OperationsExecutor {
    conf: OrchestratorConf,
    in_flight: HashSet<Uuid>,
    orchestrator: Orchestrator,
    pool: FuturesUnordered<JoinHandle<DriveResult>>,
    queue: VecDeque<Uuid>,
    receiver: mpsc::UnboundedReceiver<Uuid>,
    retries: FuturesUnordered<BoxFuture<'static, Uuid>>,
    sender: mpsc::UnboundedSender<Uuid>,
}

impl OperationsExecutor {
    /// Initialise an executor to drive operations with the given [`Orchestrator`].
    pub fn new(orchestrator: Orchestrator, conf: OrchestratorConf) -> OperationsExecutor {
        let (sender, receiver) = mpsc::unbounded_channel();
        OperationsExecutor {
            conf,
            in_flight: Default::default(),
            orchestrator,
            pool: FuturesUnordered::new(),
            queue: Default::default(),
            receiver,
            retries: FuturesUnordered::new(),
            sender,
        }
    }

    /// Drive submitted operations until the exit future resolves.
    pub async fn execute(
        &mut self,
        context: &Context,
        exit: impl Future<Output = ()>,
    ) -> Result<()> {
        let mut propagate_panic = None;
        let result = self.execute_inner(context, exit, &mut propagate_panic).await;

        // Abort drivers still running whatever the reason we stopped.
        for driver in self.pool.iter() {
            driver.abort();
        }
        self.pool.clear();
        self.in_flight.clear();
        self.retries.clear();

        if let Some(payload) = propagate_panic {
            slog::error!(context.logger, "Propagating panic from operation driver");
            std::panic::resume_unwind(payload);
        }
        result
    }

    /// Handle to submit operations to this executor.
    pub fn submitter(&self) -> OperationsSubmitter {
        OperationsSubmitter {
            sender: self.sender.clone(),
        }
    }

    /// Start driving queued operations while there is capacity for them.
    fn dispatch(&mut self, context: &Context) {
        let capacity = self.conf.concurrent_operations.max(1);
        while self.pool.len() < capacity {
            let operation_id = match self.queue.pop_front() {
                None => break,
                Some(operation_id) => operation_id,
            };
            self.in_flight.insert(operation_id);
            let orchestrator = self.orchestrator.clone();
            let context = context.clone();
            let driver = async move {
                let result = orchestrator.drive(&context, operation_id).await;
                (operation_id, result)
            };
            self.pool.push(tokio::spawn(driver));
        }
    }

    /// Queue an operation to be driven unless it is already known to the executor.
    fn enqueue(&mut self, context: &Context, operation_id: Uuid) {
        if self.in_flight.contains(&operation_id) || self.queue.contains(&operation_id) {
            slog::debug!(
                context.logger, "Ignoring operation already known to the executor";
                "operation_id" => %operation_id,
            );
            return;
        }
        self.queue.push_back(operation_id);
    }

    async fn execute_inner(
        &mut self,
        context: &Context,
        exit: impl Future<Output = ()>,
        propagate_panic: &mut Option<Box<dyn Any + Send + 'static>>,
    ) -> Result<()> {
        tokio::pin!(exit);

        if self.conf.resume_on_start {
            let operations = self
                .orchestrator
                .store()
                .query(context, ListOperationsInProgress)
                .await?;
            slog::info!(
                context.logger, "Resuming in-progress operations";
                "count" => operations.len(),
            );
            for operation in operations {
                self.enqueue(context, operation.operation_id);
            }
        }

        loop {
            self.dispatch(context);
            tokio::select! {
                _ = &mut exit => break,

                Some(operation_id) = self.receiver.recv() => {
                    self.enqueue(context, operation_id);
                },

                Some(operation_id) = self.retries.next(), if !self.retries.is_empty() => {
                    self.enqueue(context, operation_id);
                },

                result = self.pool.next(), if !self.pool.is_empty() => {
                    let result = match result {
                        None => continue,
                        Some(result) => result,
                    };
                    match result {
                        Err(error) if error.is_panic() => {
                            *propagate_panic = Some(error.into_panic());
                            break;
                        }
                        Err(error) if error.is_cancelled() => slog::debug!(
                            context.logger, "Ignoring cancelled operation driver"
                        ),
                        Err(error) => {
                            let error = anyhow::Error::from(error);
                            slog::warn!(
                                context.logger, "Unknown error from operation driver";
                                ErrorAttributes::from(&error),
                            );
                        }
                        Ok((operation_id, result)) => self.finished(context, operation_id, result),
                    };
                },
            }
        }
        Ok(())
    }

    /// Record the end of an operation driver.
    fn finished(&mut self, context: &Context, operation_id: Uuid, result: Result<Operation>) {
        self.in_flight.remove(&operation_id);
        match result {
            Ok(operation) => slog::info!(
                context.logger, "Operation reached a final state";
                "operation_id" => %operation_id,
                "state" => ?operation.state,
            ),
            Err(error) if is_caused_by::<OperationNotFound>(&error) => slog::warn!(
                context.logger, "Dropping operation that no longer exists";
                "operation_id" => %operation_id,
            ),
            Err(error) => {
                let delay = self.conf.retry_delay();
                slog::error!(
                    context.logger, "Unable to drive operation, will retry";
                    "operation_id" => %operation_id,
                    "retry_delay" => delay.as_secs(),
                    ErrorAttributes::from(&error),
                );
                let retry = tokio::time::sleep(delay).map(move |_| operation_id);
                self.retries.push(retry.boxed());
            }
        }
    }
}

/// Submit operations to an [`OperationsExecutor`] from anywhere in the process.
#[derive(Clone, Debug)]
pub struct OperationsSubmitter {
    sender: mpsc::UnboundedSender<Uuid>,
}

impl OperationsSubmitter {
    /// Request the executor drives the operation to completion.
    pub fn submit(&self, operation_id: Uuid) -> Result<()> {
        self.sender.send(operation_id).map_err(|_| ExecutorStopped {
            operation_id: operation_id.to_string(),
        })?;
        Ok(())
    }
}
