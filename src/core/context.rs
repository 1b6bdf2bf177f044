// ============================================================================
// spark-properties - Reactive Context
// Explicit stack of evaluation scopes, one context installed per thread
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use super::constants::DEFAULT_MAX_EVALUATION_DEPTH;
use super::types::{node_ptr, AnyDependent, AnySource};

// =============================================================================
// EVALUATION SCOPE
// =============================================================================

/// One frame of the evaluation stack: the dependent whose binding (or tracker
/// closure) is running, and the sources it read so far.
pub struct EvaluationScope {
    /// Who is being evaluated
    pub dependent: Weak<dyn AnyDependent>,

    /// Sources read during this evaluation, in first-read order, no duplicates
    pub deps: Vec<Rc<dyn AnySource>>,

    /// Identities of `deps`
    seen: HashSet<*const ()>,
}

impl EvaluationScope {
    fn new(dependent: Weak<dyn AnyDependent>) -> Self {
        Self { dependent, deps: Vec::new(), seen: HashSet::new() }
    }

    /// Add `source` unless it was already read. Returns whether it was added.
    fn record(&mut self, source: Rc<dyn AnySource>) -> bool {
        if !self.seen.insert(node_ptr(&source)) {
            return false;
        }
        self.deps.push(source);
        true
    }
}

// =============================================================================
// REACTIVE CONTEXT
// =============================================================================

/// Holds the stack of evaluation scopes.
///
/// Each thread has a current context. Tests and embedders that want isolated
/// state create their own with [`ReactiveContext::new`] and install it with
/// [`ReactiveContext::run`].
pub struct ReactiveContext {
    /// Innermost scope last
    scopes: RefCell<Vec<EvaluationScope>>,

    /// Whether reads are currently excluded from dependency capture
    untracking: Cell<bool>,

    /// Nesting limit for evaluations
    max_depth: usize,
}

impl ReactiveContext {
    /// Create a context with the default evaluation depth limit
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_EVALUATION_DEPTH)
    }

    /// Create a context that panics once more than `max_depth` evaluations nest.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            scopes: RefCell::new(Vec::new()),
            untracking: Cell::new(false),
            max_depth,
        }
    }

    /// Run `f` with `ctx` installed as the current context of this thread.
    ///
    /// The previous context is restored afterwards, even if `f` panics.
    pub fn run<R>(ctx: &Rc<ReactiveContext>, f: impl FnOnce() -> R) -> R {
        struct Restore(Option<Rc<ReactiveContext>>);

        impl Drop for Restore {
            fn drop(&mut self) {
                if let Some(previous) = self.0.take() {
                    CONTEXT.with(|current| *current.borrow_mut() = previous);
                }
            }
        }

        let previous = CONTEXT.with(|current| current.replace(ctx.clone()));
        let _restore = Restore(Some(previous));
        f()
    }

    // =========================================================================
    // SCOPES
    // =========================================================================

    /// Push a new scope for `dependent`.
    ///
    /// # Panics
    ///
    /// Panics when the nesting exceeds the configured maximum depth.
    pub fn push_scope(&self, dependent: Weak<dyn AnyDependent>) {
        let mut scopes = self.scopes.borrow_mut();
        if scopes.len() >= self.max_depth {
            let depth = scopes.len();
            drop(scopes);
            panic!(
                "Maximum evaluation depth exceeded ({depth} nested evaluations). \
                 This usually means bindings depend on each other in a chain that never ends."
            );
        }
        scopes.push(EvaluationScope::new(dependent));
    }

    /// Pop the innermost scope
    pub fn pop_scope(&self) -> Option<EvaluationScope> {
        self.scopes.borrow_mut().pop()
    }

    /// Record that `source` was read by the innermost scope.
    ///
    /// No-op outside any scope or while untracking.
    pub fn record_read(&self, source: Rc<dyn AnySource>) {
        if self.untracking.get() {
            return;
        }
        let mut scopes = self.scopes.borrow_mut();
        let Some(scope) = scopes.last_mut() else {
            return;
        };
        // A dependent never depends on itself
        if scope.dependent.as_ptr() as *const () == node_ptr(&source) {
            return;
        }
        scope.record(source);
    }

    /// Check if any evaluation is in progress
    pub fn has_active_scope(&self) -> bool {
        !self.scopes.borrow().is_empty()
    }

    /// Number of nested evaluations in progress
    pub fn depth(&self) -> usize {
        self.scopes.borrow().len()
    }

    /// The configured nesting limit
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Set untracking mode, returning previous value
    pub fn set_untracking(&self, value: bool) -> bool {
        self.untracking.replace(value)
    }

    /// Check if currently untracking
    pub fn is_untracking(&self) -> bool {
        self.untracking.get()
    }
}

impl Default for ReactiveContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReactiveContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveContext")
            .field("depth", &self.depth())
            .field("max_depth", &self.max_depth)
            .field("untracking", &self.untracking.get())
            .finish()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    /// The context currently installed on this thread
    static CONTEXT: RefCell<Rc<ReactiveContext>> = RefCell::new(Rc::new(ReactiveContext::new()));
}

/// Access the current reactive context of this thread.
///
/// # Example
///
/// ```ignore
/// let depth = with_context(|ctx| ctx.depth());
/// ```
pub fn with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> R {
    // Clone the handle so `f` may itself install another context.
    let ctx = CONTEXT.with(|current| current.borrow().clone());
    f(&ctx)
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Check if reads are currently being captured (inside an evaluation, not untracking)
pub fn is_tracking() -> bool {
    with_context(|ctx| ctx.has_active_scope() && !ctx.is_untracking())
}

/// Check if currently untracking
pub fn is_untracking() -> bool {
    with_context(|ctx| ctx.is_untracking())
}

/// Number of nested evaluations currently in progress
pub fn evaluation_depth() -> usize {
    with_context(|ctx| ctx.depth())
}

// =============================================================================
// TESTS
// =============================================================================
