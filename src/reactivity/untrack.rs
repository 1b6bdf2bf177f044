// ============================================================================
// spark-properties - Untrack
// Reading properties without creating dependencies
// ============================================================================

use crate::core::context::with_context;

/// Run `f` without capturing any of its reads as dependencies of the
/// evaluation currently in progress.
///
/// Bindings evaluated from inside `f` still track their own reads.
///
/// # Example
///
/// ```
/// use spark_properties::{untrack, Property};
///
/// let base = Property::new(1);
/// let hint = Property::new(10);
/// let total = Property::default();
///
/// let (b, h) = (base.clone(), hint.clone());
/// total.set_binding(move || b.get() + untrack(|| h.get()));
/// assert_eq!(total.get(), 11);
///
/// hint.set(20);
/// assert_eq!(total.get(), 11); // not a dependency
///
/// base.set(2);
/// assert_eq!(total.get(), 22);
/// ```
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let prev = with_context(|ctx| ctx.set_untracking(true));

    // Use a guard pattern to ensure we restore even on panic
    struct UntrackGuard {
        prev: bool,
    }

    impl Drop for UntrackGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_untracking(self.prev));
        }
    }

    let _guard = UntrackGuard { prev };
    f()
}
