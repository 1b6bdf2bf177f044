// ============================================================================
// spark-properties - Primitives Module
// Dependency-tracked properties and property trackers
// ============================================================================

pub mod property;
pub mod tracker;

// Re-export for convenience
pub use property::{Property, PropertyInner};
pub use tracker::{PropertyTracker, TrackerInner};
