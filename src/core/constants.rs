// ============================================================================
// spark-properties - Constants
// Flag constants for properties and trackers in the dependency graph
// ============================================================================

// =============================================================================
// NODE TYPE FLAGS
// =============================================================================

/// Node is a property (holds a value, may hold a binding)
pub const PROPERTY: u32 = 1 << 0;

/// Node is a property tracker
pub const TRACKER: u32 = 1 << 1;

/// Property currently has a binding installed
pub const HAS_BINDING: u32 = 1 << 2;

/// Property binding is a two-way link to a common property
pub const TWO_WAY: u32 = 1 << 3;

// =============================================================================
// STATE FLAGS
// =============================================================================

/// Node is clean (cached value / captured dependency set is up to date)
pub const CLEAN: u32 = 1 << 10;

/// Node is dirty (something it read was written since last evaluation)
pub const DIRTY: u32 = 1 << 11;

/// Node is currently evaluating (binding or tracker closure on the stack)
pub const EVALUATING: u32 = 1 << 12;

// =============================================================================
// MASKS
// =============================================================================

/// Mask to clear the CLEAN/DIRTY status bits
pub const STATUS_MASK: u32 = !(DIRTY | CLEAN);

// =============================================================================
// LIMITS
// =============================================================================

/// Default maximum nesting of binding/tracker evaluations before failing fast.
pub const DEFAULT_MAX_EVALUATION_DEPTH: usize = 1000;

// =============================================================================
// TESTS
// =============================================================================
