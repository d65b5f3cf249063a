//! Pipeline metrics
//!
//! Recorded through the `metrics` facade; without an installed recorder every
//! call is a no-op.

use std::time::Duration;

use contracts::{RunOutcome, StageId};
use metrics::{counter, gauge, histogram};

/// One finished stage. `decision` is a short label such as `continue`,
/// `proved_true` or a failure cause.
pub fn record_stage(stage: StageId, decision: &str, elapsed: Duration) {
    counter!(
        "qbf_certify_stage_runs_total",
        "stage" => stage.name(),
        "decision" => decision.to_string()
    )
    .increment(1);

    histogram!("qbf_certify_stage_duration_ms", "stage" => stage.name())
        .record(elapsed.as_secs_f64() * 1000.0);
}

/// Dependency preflight result
pub fn record_preflight(checked: usize, missing: usize) {
    gauge!("qbf_certify_dependencies_checked").set(checked as f64);
    gauge!("qbf_certify_dependencies_missing").set(missing as f64);
}

/// The single outcome of a run
pub fn record_run_outcome(outcome: &RunOutcome, elapsed: Duration) {
    counter!("qbf_certify_runs_total", "outcome" => outcome.label()).increment(1);
    histogram!("qbf_certify_run_duration_ms").record(elapsed.as_secs_f64() * 1000.0);

    if let RunOutcome::StageFailed(failure) = outcome {
        counter!(
            "qbf_certify_stage_failures_total",
            "stage" => failure.stage.name(),
            "exit_status" => failure.exit_code().to_string()
        )
        .increment(1);
    }
}
