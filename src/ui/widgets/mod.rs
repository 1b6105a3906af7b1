// src/ui/widgets/mod.rs

pub mod footer;  // Key hints for the current state.
pub mod input;   // The target host input field.
pub mod results; // Per-test list with a details pane.
pub mod summary; // Grade, score and pass/fail counts.
