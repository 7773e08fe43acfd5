//! Prometheus metrics for the run coordinator.

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

/// Analysis runs submitted, by source ("selected", "all").
pub static RUNS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("triago_runs_submitted_total", "Analysis runs submitted"),
        &["source"],
    )
    .unwrap()
});

/// Run status checks, by result ("ok", "error").
pub static STATUS_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("triago_status_checks_total", "Run status checks performed"),
        &["result"],
    )
    .unwrap()
});

/// Terminal run outcomes observed, by kind ("completed", "failed", "gave_up").
pub static RUN_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("triago_run_outcomes_total", "Terminal run outcomes observed"),
        &["outcome"],
    )
    .unwrap()
});

/// Tickets claimed by submitted or recovered runs.
pub static TICKETS_CLAIMED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("triago_tickets_claimed_total", "Tickets claimed by runs").unwrap()
});

/// Active runs re-attached by the reconciler after a restart.
pub static RUNS_RECOVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("triago_runs_recovered_total", "Runs re-attached on recovery").unwrap()
});

/// CSV import rows skipped as malformed.
pub static IMPORT_ROWS_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "triago_import_rows_skipped_total",
        "CSV import rows skipped as malformed",
    )
    .unwrap()
});

/// Register all coordinator metrics with the given registry.
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(RUNS_SUBMITTED.clone()))?;
    registry.register(Box::new(STATUS_CHECKS.clone()))?;
    registry.register(Box::new(RUN_OUTCOMES.clone()))?;
    registry.register(Box::new(TICKETS_CLAIMED.clone()))?;
    registry.register(Box::new(RUNS_RECOVERED.clone()))?;
    registry.register(Box::new(IMPORT_ROWS_SKIPPED.clone()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();

        RUNS_SUBMITTED.with_label_values(&["selected"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "triago_runs_submitted_total"));
    }
}
