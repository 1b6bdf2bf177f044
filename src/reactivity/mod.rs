// ============================================================================
// spark-properties - Reactivity Module
// Read capture, dependency installation, and dirty propagation
// ============================================================================

pub mod tracking;
pub mod untrack;

// Re-export main tracking functions
pub use tracking::{evaluate_in_scope, install_dependencies, mark_dependents_dirty, track_read};

pub use untrack::untrack;
