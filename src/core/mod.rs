// ============================================================================
// spark-properties - Core Module
// Graph traits, flags, and the evaluation context
// ============================================================================

pub mod constants;
pub mod context;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use context::{evaluation_depth, is_tracking, is_untracking, with_context, EvaluationScope, ReactiveContext};
pub use types::{node_ptr, AnyDependent, AnySource, GraphNode};
