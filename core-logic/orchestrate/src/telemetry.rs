//! Telemetry related to operations orchestration.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::Counter;
use prometheus::CounterVec;
use prometheus::Opts;

/// Number of operations that completed successfully.
pub static OPERATIONS_SUCCEEDED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "provisioner_operations_succeeded",
        "Number of operations that completed successfully",
    )
    .expect("failed to initialise OPERATIONS_SUCCEEDED counter")
});

/// Number of operations that failed.
pub static OPERATIONS_FAILED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "provisioner_operations_failed",
        "Number of operations that failed",
    )
    .expect("failed to initialise OPERATIONS_FAILED counter")
});

/// Total number of stage invocations.
pub static STAGE_INVOKE_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "provisioner_stage_invoke_count",
            "Total number of stage invocations",
        ),
        &["stage"],
    )
    .expect("failed to initialise STAGE_INVOKE_COUNT counter")
});

/// Number of stage invocations that resulted in error.
pub static STAGE_INVOKE_ERR: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "provisioner_stage_invoke_error",
            "Number of stage invocations that resulted in error",
        ),
        &["stage"],
    )
    .expect("failed to initialise STAGE_INVOKE_ERR counter")
});

/// Number of operations that exceeded a stage time budget.
pub static STAGE_TIMEOUT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "provisioner_stage_timeout",
            "Number of operations that exceeded a stage time budget",
        ),
        &["stage"],
    )
    .expect("failed to initialise STAGE_TIMEOUT counter")
});

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the orchestration metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 5] = [
        Box::new(OPERATIONS_FAILED.clone()),
        Box::new(OPERATIONS_SUCCEEDED.clone()),
        Box::new(STAGE_INVOKE_COUNT.clone()),
        Box::new(STAGE_INVOKE_ERR.clone()),
        Box::new(STAGE_TIMEOUT.clone()),
    ];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}
