// ============================================================================
// spark-properties - Ergonomic Macros
// ============================================================================

/// Helper macro to clone variables into a move closure.
///
/// This reduces the boilerplate of manually cloning `Rc` or `Property`
/// handles before moving them into a closure.
///
/// # Usage
///
/// ```rust
/// use spark_properties::{cloned, Property};
///
/// let a = Property::new(1);
/// let b = Property::new(2);
/// let sum = Property::new(0);
///
/// sum.set_binding(cloned!(a, b => move || a.get() + b.get()));
/// assert_eq!(sum.get(), 3);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Install a binding with automatic variable capturing.
///
/// Wraps `target.set_binding(cloned!(... => move || ...))`.
///
/// # Usage
///
/// ```rust
/// use spark_properties::{binding, Property};
///
/// let width = Property::new(4);
/// let height = Property::new(5);
/// let area = Property::new(0);
///
/// // Clean syntax: target, deps => expression
/// binding!(area, width, height => width.get() * height.get());
/// assert_eq!(area.get(), 20);
///
/// // Without dependencies
/// binding!(area => 7);
/// assert_eq!(area.get(), 7);
/// ```
#[macro_export]
macro_rules! binding {
    // Case 1: No dependencies (just expression)
    ($target:expr => $body:expr) => {
        $target.set_binding(move || $body)
    };
    // Case 2: With dependencies
    ($target:expr, $($deps:ident),+ => $body:expr) => {
        $target.set_binding($crate::cloned!($($deps),+ => move || $body))
    };
}
