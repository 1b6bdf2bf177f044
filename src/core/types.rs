// ============================================================================
// spark-properties - Type Definitions
// Type-erased traits and shared graph bookkeeping for properties and trackers
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use super::constants::*;

// =============================================================================
// TYPE-ERASED TRAITS
// =============================================================================
//
// Graph operations (mark dirty, record a read, install dependencies) never
// need the value type T. Only Property<T>::get/set do. So the graph stores:
//
// - Vec<Rc<dyn AnySource>>       what a dependent read during its last run
// - Vec<Weak<dyn AnyDependent>>  who read a source (never keeps them alive)
//
// A bound property and a tracker are both: they can be read (source) and they
// record what they read (dependent).
// =============================================================================

/// Something that can be read inside an evaluation scope.
///
/// Implemented by `PropertyInner<T>` and `TrackerInner`.
pub trait AnySource: Any {
    /// Get the flags bitmask
    fn flags(&self) -> u32;

    /// Number of dependent handles (live or not yet pruned)
    fn dependent_count(&self) -> usize;

    /// Register a dependent that read this source
    fn add_dependent(&self, dependent: Weak<dyn AnyDependent>);

    /// Remove the dependent whose allocation starts at `dependent`
    fn remove_dependent(&self, dependent: *const ());

    /// Drop handles to dependents that no longer exist
    fn cleanup_dead_dependents(&self);

    /// Call `f` for each live dependent.
    fn for_each_dependent(&self, f: &mut dyn FnMut(Rc<dyn AnyDependent>));

    /// Check if this source is dirty
    fn is_dirty(&self) -> bool {
        self.flags() & DIRTY != 0
    }

    /// Upcast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Something that records the sources it reads and can be marked dirty.
pub trait AnyDependent: Any {
    /// Get the flags bitmask
    fn flags(&self) -> u32;

    /// Set the flags bitmask
    fn set_flags(&self, flags: u32);

    /// Number of sources captured during the last evaluation
    fn dep_count(&self) -> usize;

    /// Replace the captured sources, returning the previous set
    fn replace_deps(&self, deps: Vec<Rc<dyn AnySource>>) -> Vec<Rc<dyn AnySource>>;

    /// Called once per clean -> dirty transition, after propagation finished.
    fn dirty_notification(&self) {}

    /// If this dependent can itself be read (bound property, tracker), return it
    /// as a source so dirtiness cascades to its own dependents.
    fn as_source(&self) -> Option<Rc<dyn AnySource>>;

    /// Check if this dependent is dirty
    fn is_dirty(&self) -> bool {
        self.flags() & DIRTY != 0
    }

    /// Check if this dependent is clean
    fn is_clean(&self) -> bool {
        self.flags() & CLEAN != 0
    }

    /// Check if this dependent is currently evaluating
    fn is_evaluating(&self) -> bool {
        self.flags() & EVALUATING != 0
    }

    /// Mark as dirty (clear status bits, set DIRTY)
    fn mark_dirty(&self) {
        self.set_flags((self.flags() & STATUS_MASK) | DIRTY);
    }

    /// Mark as clean (clear status bits, set CLEAN)
    fn mark_clean(&self) {
        self.set_flags((self.flags() & STATUS_MASK) | CLEAN);
    }

    /// Upcast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Identity of an `Rc` allocation, independent of the trait object it is seen through.
pub fn node_ptr<T: ?Sized>(rc: &Rc<T>) -> *const () {
    Rc::as_ptr(rc) as *const ()
}

// =============================================================================
// GRAPH NODE
// =============================================================================

/// The bookkeeping shared by every node of the dependency graph.
///
/// Properties and trackers embed one of these and implement the graph traits
/// by delegating to it.
pub struct GraphNode {
    /// Flags bitmask (type + status)
    flags: Cell<u32>,

    /// Dependents that read this node (weak: a node never keeps a reader alive)
    dependents: RefCell<SmallVec<[Weak<dyn AnyDependent>; 2]>>,

    /// Sources this node read during its last evaluation
    deps: RefCell<Vec<Rc<dyn AnySource>>>,
}

impl GraphNode {
    /// Create a node with the given initial flags
    pub fn new(flags: u32) -> Self {
        Self {
            flags: Cell::new(flags),
            dependents: RefCell::new(SmallVec::new()),
            deps: RefCell::new(Vec::new()),
        }
    }

    pub fn flags(&self) -> u32 {
        self.flags.get()
    }

    pub fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    /// Set or clear a single flag bit
    pub fn toggle(&self, flag: u32, on: bool) {
        let flags = self.flags.get();
        self.flags.set(if on { flags | flag } else { flags & !flag });
    }

    pub fn dependent_count(&self) -> usize {
        self.dependents.borrow().len()
    }

    pub fn add_dependent(&self, dependent: Weak<dyn AnyDependent>) {
        let mut dependents = self.dependents.borrow_mut();
        if !dependents.iter().any(|d| Weak::ptr_eq(d, &dependent)) {
            dependents.push(dependent);
        }
    }

    pub fn remove_dependent(&self, dependent: *const ()) {
        self.dependents
            .borrow_mut()
            .retain(|d| Weak::as_ptr(d) as *const () != dependent);
    }

    pub fn cleanup_dead_dependents(&self) {
        self.dependents.borrow_mut().retain(|d| d.strong_count() > 0);
    }

    /// Collect-then-call: the borrow is released before `f` runs, so `f` may
    /// freely register or remove dependents on this node.
    pub fn for_each_dependent(&self, f: &mut dyn FnMut(Rc<dyn AnyDependent>)) {
        let live: SmallVec<[Rc<dyn AnyDependent>; 4]> =
            self.dependents.borrow().iter().filter_map(Weak::upgrade).collect();
        for dependent in live {
            f(dependent);
        }
    }

    pub fn dep_count(&self) -> usize {
        self.deps.borrow().len()
    }

    pub fn replace_deps(&self, deps: Vec<Rc<dyn AnySource>>) -> Vec<Rc<dyn AnySource>> {
        self.deps.replace(deps)
    }

    /// Unregister `owner` from every source it read. Used when the owner is
    /// dropped or its binding is removed.
    pub fn detach(&self, owner: *const ()) {
        let deps = self.deps.take();
        for dep in deps {
            dep.remove_dependent(owner);
        }
    }
}

impl std::fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphNode")
            .field("flags", &format_args!("{:#b}", self.flags.get()))
            .field("dependents", &self.dependent_count())
            .field("deps", &self.dep_count())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
