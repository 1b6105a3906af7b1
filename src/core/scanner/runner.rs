// src/core/scanner/runner.rs

use crate::core::checks::CheckRegistry;
use crate::core::models::{CheckResult, ResponseBundle};
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{debug, error, warn};

/// Runs every registered check against the same bundle.
///
/// Checks run concurrently on the blocking pool, but results come back in
/// registry order, exactly one per check. A check that errors or panics is
/// recorded as a neutral result instead of taking the scan down with it.
pub async fn run_checks(bundle: Arc<ResponseBundle>, registry: &CheckRegistry) -> Vec<CheckResult> {
    let handles: Vec<_> = registry
        .iter()
        .map(|check| {
            let check = Arc::clone(check);
            let bundle = Arc::clone(&bundle);
            let name = check.name();
            (name, spawn_blocking(move || check.evaluate(&bundle)))
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let result = match handle.await {
            Ok(Ok(mut result)) => {
                if result.name != name {
                    warn!(check = name, reported = %result.name, "Check reported under a different name; using its registered one.");
                    result.name = name.to_string();
                }
                debug!(check = name, pass = ?result.pass, modifier = result.score_modifier, "Check finished.");
                result
            }
            Ok(Err(e)) => {
                warn!(check = name, error = %e, "Check could not reach a verdict.");
                CheckResult::neutral(name)
            }
            Err(e) => {
                error!(check = name, panic = %e, "Check task panicked!");
                CheckResult::neutral(name)
            }
        };
        results.push(result);
    }
    results
}
