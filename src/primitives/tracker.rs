// ============================================================================
// spark-properties - Property Tracker
// Records the properties read by a closure and reports when any of them change
// ============================================================================

use std::any::Any;
use std::rc::{Rc, Weak};

use crate::core::constants::*;
use crate::core::types::{AnyDependent, AnySource, GraphNode};
use crate::reactivity::tracking::{evaluate_in_scope, mark_dependents_dirty, track_read};

// =============================================================================
// TRACKER INNER
// =============================================================================

/// The internal data for a property tracker.
pub struct TrackerInner {
    node: GraphNode,

    /// Runs once every time the tracker goes from clean to dirty
    dirty_handler: Option<Box<dyn Fn()>>,

    self_ref: Weak<TrackerInner>,
}

impl TrackerInner {
    fn new(dirty_handler: Option<Box<dyn Fn()>>) -> Rc<Self> {
        // Trackers start dirty: nothing has been evaluated yet
        Rc::new_cyclic(|me| Self {
            node: GraphNode::new(TRACKER | DIRTY),
            dirty_handler,
            self_ref: me.clone(),
        })
    }
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        self.node.detach(self as *const Self as *const ());
    }
}

impl AnySource for TrackerInner {
    fn flags(&self) -> u32 {
        self.node.flags()
    }

    fn dependent_count(&self) -> usize {
        self.node.dependent_count()
    }

    fn add_dependent(&self, dependent: Weak<dyn AnyDependent>) {
        self.node.add_dependent(dependent);
    }

    fn remove_dependent(&self, dependent: *const ()) {
        self.node.remove_dependent(dependent);
    }

    fn cleanup_dead_dependents(&self) {
        self.node.cleanup_dead_dependents();
    }

    fn for_each_dependent(&self, f: &mut dyn FnMut(Rc<dyn AnyDependent>)) {
        self.node.for_each_dependent(f);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl AnyDependent for TrackerInner {
    fn flags(&self) -> u32 {
        self.node.flags()
    }

    fn set_flags(&self, flags: u32) {
        self.node.set_flags(flags);
    }

    fn dep_count(&self) -> usize {
        self.node.dep_count()
    }

    fn replace_deps(&self, deps: Vec<Rc<dyn AnySource>>) -> Vec<Rc<dyn AnySource>> {
        self.node.replace_deps(deps)
    }

    fn dirty_notification(&self) {
        if let Some(handler) = &self.dirty_handler {
            handler();
        }
    }

    fn as_source(&self) -> Option<Rc<dyn AnySource>> {
        self.self_ref.upgrade().map(|me| me as Rc<dyn AnySource>)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// PROPERTY TRACKER - Public API
// =============================================================================

/// Observes which properties a closure reads.
///
/// After [`evaluate`](Self::evaluate) the tracker is clean. It becomes dirty
/// as soon as any property read during the last evaluation is written.
/// Trackers can nest: evaluating one tracker inside another makes the outer
/// one depend on the inner one.
///
/// # Example
///
/// ```
/// use spark_properties::{Property, PropertyTracker};
///
/// let text = Property::new("hello".to_string());
/// let tracker = PropertyTracker::default();
///
/// let len = tracker.evaluate(|| text.get().len());
/// assert_eq!(len, 5);
/// assert!(!tracker.is_dirty());
///
/// text.set("hi".into());
/// assert!(tracker.is_dirty());
/// ```
pub struct PropertyTracker {
    inner: Rc<TrackerInner>,
}

impl PropertyTracker {
    /// Create a tracker. It starts dirty.
    pub fn new() -> Self {
        Self { inner: TrackerInner::new(None) }
    }

    /// Create a tracker whose `handler` runs every time it goes from clean to dirty.
    ///
    /// The handler runs after the write that caused it has finished
    /// propagating. It must not evaluate the tracker itself; typically it
    /// schedules work for later.
    pub fn new_with_dirty_handler(handler: impl Fn() + 'static) -> Self {
        Self { inner: TrackerInner::new(Some(Box::new(handler))) }
    }

    /// Check if a tracked property changed since the last evaluation
    pub fn is_dirty(&self) -> bool {
        self.inner.node.flags() & DIRTY != 0
    }

    /// Run `f`, recording every property it reads, and return its result.
    ///
    /// If another evaluation is in progress, this tracker becomes one of its
    /// dependencies.
    pub fn evaluate<R>(&self, f: impl FnOnce() -> R) -> R {
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        self.evaluate_as_dependency_root(f)
    }

    /// Like [`evaluate`](Self::evaluate), without registering this tracker
    /// with the enclosing evaluation.
    ///
    /// # Panics
    ///
    /// Panics with "Recursion detected" if called while this tracker is
    /// already evaluating.
    pub fn evaluate_as_dependency_root<R>(&self, f: impl FnOnce() -> R) -> R {
        if self.inner.node.flags() & EVALUATING != 0 {
            panic!("Recursion detected: a property tracker was evaluated from inside its own evaluation");
        }
        let result = evaluate_in_scope(self.inner.clone() as Rc<dyn AnyDependent>, f);
        self.inner.node.set_flags((self.inner.node.flags() & STATUS_MASK) | CLEAN);
        result
    }

    /// Evaluate only if dirty; `None` when the tracker was already clean.
    ///
    /// Either way the tracker becomes a dependency of the enclosing evaluation.
    pub fn evaluate_if_dirty<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        if self.is_dirty() { Some(self.evaluate_as_dependency_root(f)) } else { None }
    }

    /// Force the tracker dirty, as if a tracked property had changed.
    pub fn set_dirty(&self) {
        let was_dirty = self.is_dirty();
        self.inner.node.set_flags((self.inner.node.flags() & STATUS_MASK) | DIRTY);
        mark_dependents_dirty(self.inner.clone() as Rc<dyn AnySource>);
        if !was_dirty {
            self.inner.dirty_notification();
        }
    }

    /// Number of properties (or inner trackers) read during the last evaluation
    pub fn dependency_count(&self) -> usize {
        self.inner.node.dep_count()
    }
}

impl Default for PropertyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PropertyTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyTracker")
            .field("dirty", &self.is_dirty())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Property;
    use std::cell::Cell;

    #[test]
    fn starts_dirty() {
        let tracker = PropertyTracker::new();
        assert!(tracker.is_dirty());
        assert_eq!(tracker.evaluate_if_dirty(|| 1), Some(1));
        assert_eq!(tracker.evaluate_if_dirty(|| 2), None);
    }

    #[test]
    fn nothing_read_stays_clean() {
        let tracker = PropertyTracker::new();
        tracker.evaluate(|| ());
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.dependency_count(), 0);
    }

    #[test]
    fn set_dirty_runs_handler_once() {
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let tracker = PropertyTracker::new_with_dirty_handler(move || c.set(c.get() + 1));
        tracker.evaluate(|| ());

        tracker.set_dirty();
        tracker.set_dirty();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn handler_fires_on_property_write() {
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let tracker = PropertyTracker::new_with_dirty_handler(move || c.set(c.get() + 1));
        let p = Property::new(1);

        tracker.evaluate(|| p.get());
        p.set(2);
        p.set(3);
        assert_eq!(calls.get(), 1);

        tracker.evaluate(|| p.get());
        p.set(4);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn nested_trackers_propagate() {
        let p = Property::new(1);
        let outer = PropertyTracker::new();
        let inner = PropertyTracker::new();

        outer.evaluate(|| inner.evaluate(|| p.get()));
        assert!(!outer.is_dirty());
        assert!(!inner.is_dirty());

        p.set(2);
        assert!(inner.is_dirty());
        assert!(outer.is_dirty());
    }

    #[test]
    fn dependency_root_does_not_register_with_outer() {
        let p = Property::new(1);
        let outer = PropertyTracker::new();
        let inner = PropertyTracker::new();

        outer.evaluate(|| inner.evaluate_as_dependency_root(|| p.get()));
        p.set(2);

        assert!(inner.is_dirty());
        assert!(!outer.is_dirty());
    }

    #[test]
    #[should_panic(expected = "Recursion detected")]
    fn self_evaluation_panics() {
        let tracker = Rc::new(PropertyTracker::new());
        let t = tracker.clone();
        tracker.evaluate(move || t.evaluate(|| ()));
    }
}
