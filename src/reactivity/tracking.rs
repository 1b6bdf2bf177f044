// ============================================================================
// spark-properties - Dependency Tracking
// Capturing reads, installing dependency sets, and propagating dirtiness
// ============================================================================
//
// Borrow scoping is the recurring theme here: every RefCell borrow is released
// before a dependent is mutated or user code runs ("collect-then-mutate").
// ============================================================================

use std::collections::HashSet;
use std::rc::Rc;

use crate::core::context::with_context;
use crate::core::types::{node_ptr, AnyDependent, AnySource};

// =============================================================================
// TRACK READ - Register a dependency when a source is read
// =============================================================================

/// Track a read of `source`, registering it with the innermost evaluation scope.
///
/// Called by `Property::get()` and `PropertyTracker::evaluate()`. Outside any
/// evaluation, or inside [`untrack`](crate::untrack), this does nothing.
pub fn track_read(source: Rc<dyn AnySource>) {
    with_context(|ctx| ctx.record_read(source));
}

// =============================================================================
// EVALUATE IN SCOPE - Run a closure while capturing its reads
// =============================================================================

/// Run `f` as the evaluation of `dependent`.
///
/// Every source read by `f` is captured; afterwards the captured set replaces
/// the dependent's previous dependency set. The dependent is flagged as
/// evaluating for the duration, and the scope is always popped, even if `f`
/// panics.
pub fn evaluate_in_scope<R>(dependent: Rc<dyn AnyDependent>, f: impl FnOnce() -> R) -> R {
    use crate::core::constants::EVALUATING;

    struct ScopeGuard {
        dependent: Rc<dyn AnyDependent>,
        prev_untracking: bool,
        finished: bool,
    }

    impl Drop for ScopeGuard {
        fn drop(&mut self) {
            let scope = with_context(|ctx| {
                ctx.set_untracking(self.prev_untracking);
                ctx.pop_scope()
            });
            self.dependent
                .set_flags(self.dependent.flags() & !EVALUATING);
            if self.finished {
                if let Some(scope) = scope {
                    install_dependencies(&self.dependent, scope.deps);
                }
            }
        }
    }

    // Reads inside a binding are always tracked, even when the binding is
    // evaluated from inside `untrack`.
    let prev_untracking = with_context(|ctx| {
        ctx.push_scope(Rc::downgrade(&dependent));
        ctx.set_untracking(false)
    });
    dependent.set_flags(dependent.flags() | EVALUATING);

    let mut guard = ScopeGuard { dependent, prev_untracking, finished: false };
    let result = f();
    guard.finished = true;
    result
}

// =============================================================================
// INSTALL DEPENDENCIES - Swap a dependent's dependency set
// =============================================================================

/// Replace the dependency set of `dependent` with `deps`.
///
/// Sources no longer read forget the dependent; newly read sources learn about
/// it. Sources read both times are left untouched.
pub fn install_dependencies(dependent: &Rc<dyn AnyDependent>, deps: Vec<Rc<dyn AnySource>>) {
    let me = node_ptr(dependent);
    let new_ptrs: HashSet<*const ()> = deps.iter().map(node_ptr).collect();

    let old = dependent.replace_deps(deps.clone());
    let old_ptrs: HashSet<*const ()> = old.iter().map(node_ptr).collect();

    for source in &old {
        if !new_ptrs.contains(&node_ptr(source)) {
            source.remove_dependent(me);
        }
    }
    for source in &deps {
        if !old_ptrs.contains(&node_ptr(source)) {
            source.add_dependent(Rc::downgrade(dependent));
        }
    }
}

// =============================================================================
// MARK DEPENDENTS DIRTY - Propagate a write through the graph
// =============================================================================

/// Mark every transitive dependent of `source` dirty.
///
/// Bound properties and trackers are sources in their own right, so dirtiness
/// cascades through them. Each node is visited once per call. Dirty handlers
/// run after the whole graph has been marked, once per node that went from
/// clean to dirty.
///
/// Iterative with an explicit stack so deep chains never overflow.
pub fn mark_dependents_dirty(source: Rc<dyn AnySource>) {
    let mut stack: Vec<Rc<dyn AnySource>> = vec![source];
    let mut visited: HashSet<*const ()> = HashSet::new();
    let mut newly_dirty: Vec<Rc<dyn AnyDependent>> = Vec::new();

    while let Some(current) = stack.pop() {
        current.cleanup_dead_dependents();

        // BORROW SAFETY: collect first, the dependents list borrow is released
        let mut dependents: Vec<Rc<dyn AnyDependent>> = Vec::new();
        current.for_each_dependent(&mut |dependent| dependents.push(dependent));

        for dependent in dependents {
            if !visited.insert(node_ptr(&dependent)) {
                continue;
            }

            if !dependent.is_dirty() {
                dependent.mark_dirty();
                newly_dirty.push(dependent.clone());
            }

            // Even an already dirty node cascades: its readers may have been
            // evaluated against a stale snapshot in between.
            if let Some(as_source) = dependent.as_source() {
                stack.push(as_source);
            }
        }
    }

    for dependent in newly_dirty {
        dependent.dirty_notification();
    }
}

// =============================================================================
// TESTS
// =============================================================================
