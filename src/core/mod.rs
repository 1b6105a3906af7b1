// src/core/mod.rs

/// Data structures shared by every stage of a scan: the response bundle,
/// check results and the final report.
pub mod models;

/// Check units and the registry that holds them.
pub mod checks;

/// Score aggregation and the grade table.
pub mod grader;

/// Result codes with their score modifiers and descriptions.
pub mod knowledge_base;

/// Retrieval, check running and the scan orchestrator.
pub mod scanner;
