// src/core/scanner/mod.rs

//! Scan orchestration: retrieve, run checks, score, grade, report.

pub mod retriever;
pub mod runner;

use crate::config::ScannerConfig;
use crate::core::checks::CheckRegistry;
use crate::core::grader::{aggregate_score, grade};
use crate::core::models::{
    CheckResult, ResponseBundle, ScanOptions, ScanOutcome, ScanReport, ScanSummary, TestEntry,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Scans `hostname` end to end.
///
/// The retriever is the only part that touches the network. If it cannot
/// produce an `auto` response, the outcome is the bare `site down` error and
/// no check runs.
///
/// # Arguments
/// * `hostname` - The host to scan (e.g. "example.com").
/// * `options` - Ports, path, cookies and headers, forwarded to the retriever untouched.
/// * `config` - Network policy for the retriever.
/// * `registry` - The checks to run.
pub async fn run_full_scan(
    hostname: &str,
    options: &ScanOptions,
    config: &ScannerConfig,
    registry: &CheckRegistry,
) -> ScanOutcome {
    info!(hostname, "Starting scan.");
    let bundle = retriever::retrieve_all(hostname, options, config).await;
    let outcome = scan_bundle(bundle, registry).await;
    match &outcome {
        ScanOutcome::Reported(report) => info!(
            hostname,
            grade = %report.scan.grade,
            score = report.scan.score,
            "Scan finished."
        ),
        ScanOutcome::Failed { error } => warn!(hostname, error = %error, "Scan aborted."),
    }
    outcome
}

/// Everything after retrieval: runs the checks on an already fetched bundle.
pub async fn scan_bundle(bundle: ResponseBundle, registry: &CheckRegistry) -> ScanOutcome {
    let Some(auto) = bundle.auto() else {
        return ScanOutcome::site_down();
    };
    let response_headers = auto.headers.clone();

    let results = runner::run_checks(Arc::new(bundle), registry).await;
    ScanOutcome::Reported(assemble_report(&results, response_headers, registry.len()))
}

/// Builds the report from check results without touching them.
///
/// `tests_failed` counts every result that did not explicitly pass, so
/// not-applicable results land there too and the totals always add up to
/// `tests_quantity`.
pub fn assemble_report(
    results: &[CheckResult],
    response_headers: BTreeMap<String, String>,
    tests_quantity: usize,
) -> ScanReport {
    let score = aggregate_score(results);
    let graded = grade(score);
    let tests_passed = results.iter().filter(|r| r.passed()).count();

    ScanReport {
        scan: ScanSummary {
            grade: graded.grade,
            likelihood_indicator: graded.likelihood,
            response_headers,
            score,
            tests_failed: tests_quantity.saturating_sub(tests_passed),
            tests_passed,
            tests_quantity,
        },
        tests: results
            .iter()
            .map(|r| (r.name.clone(), TestEntry::from(r)))
            .collect(),
    }
}
