// ============================================================================
// spark-properties - Property
// A value cell with an optional binding and automatic dependency tracking
// ============================================================================
//
// A Property is BOTH a Source (it can be read, it has dependents) AND a
// Dependent (while it holds a binding, it records what the binding read).
// Bindings are lazy: a write only marks the property dirty, the binding runs
// again on the next read.
// ============================================================================

use std::any::Any;
use std::rc::{Rc, Weak};
use std::cell::RefCell;

use crate::core::constants::*;
use crate::core::types::{AnyDependent, AnySource, GraphNode};
use crate::reactivity::tracking::{evaluate_in_scope, mark_dependents_dirty, track_read};

// =============================================================================
// BINDING
// =============================================================================

/// What produces a bound property's value.
enum Binding<T> {
    /// A user closure
    Closure(Rc<dyn Fn() -> T>),

    /// The property mirrors a common property shared with its two-way partners
    TwoWay(Property<T>),
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        match self {
            Binding::Closure(f) => Binding::Closure(f.clone()),
            Binding::TwoWay(common) => Binding::TwoWay(common.clone()),
        }
    }
}

impl<T: Clone + 'static> Binding<T> {
    fn evaluate(&self) -> T {
        match self {
            Binding::Closure(f) => f(),
            Binding::TwoWay(common) => common.get(),
        }
    }
}

// =============================================================================
// PROPERTY INNER
// =============================================================================

/// The internal data for a property.
pub struct PropertyInner<T> {
    /// Flags, dependents, and captured dependencies
    node: GraphNode,

    /// Current (or last computed) value
    value: RefCell<T>,

    /// Installed binding, if any
    binding: RefCell<Option<Binding<T>>>,

    /// Self-reference for as_source() and scope registration
    self_ref: Weak<PropertyInner<T>>,
}

impl<T: Clone + 'static> PropertyInner<T> {
    fn new(value: T) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            node: GraphNode::new(PROPERTY | CLEAN),
            value: RefCell::new(value),
            binding: RefCell::new(None),
            self_ref: me.clone(),
        })
    }

    fn self_ptr(&self) -> *const () {
        self as *const Self as *const ()
    }

    /// Re-run the binding if the property is bound and dirty.
    fn update(&self) {
        let flags = self.node.flags();
        if flags & HAS_BINDING == 0 || flags & DIRTY == 0 {
            return;
        }
        if flags & EVALUATING != 0 {
            panic!("Recursion detected: a property binding read its own value");
        }

        let Some(binding) = self.binding.borrow().clone() else {
            return;
        };
        let Some(me) = self.self_ref.upgrade() else {
            return;
        };

        let value = evaluate_in_scope(me as Rc<dyn AnyDependent>, || binding.evaluate());
        *self.value.borrow_mut() = value;
        self.node.set_flags((self.node.flags() & STATUS_MASK) | CLEAN);
    }

    fn two_way_common(&self) -> Option<Property<T>> {
        match &*self.binding.borrow() {
            Some(Binding::TwoWay(common)) => Some(common.clone()),
            _ => None,
        }
    }

    /// The common property at the end of the two-way chain.
    ///
    /// A merged group's old common property forwards to the new one.
    fn two_way_root(&self) -> Option<Property<T>> {
        let mut root = self.two_way_common()?;
        while let Some(next) = root.inner.two_way_common() {
            root = next;
        }
        Some(root)
    }

    /// Move `from`'s value or plain binding onto `common`.
    fn move_state_onto(common: &Property<T>, from: &Property<T>) {
        match from.inner.remove_binding() {
            Some(Binding::Closure(f)) => common.inner.install_binding(Binding::Closure(f)),
            _ => common.set(from.get_untracked()),
        }
    }

    fn assert_not_evaluating(&self) {
        if self.node.flags() & EVALUATING != 0 {
            panic!("Recursion detected: a property was written while its own binding was evaluating");
        }
    }

    /// Take the binding out and forget everything it depended on.
    fn remove_binding(&self) -> Option<Binding<T>> {
        let binding = self.binding.borrow_mut().take();
        if binding.is_some() {
            self.node.toggle(HAS_BINDING | TWO_WAY, false);
            self.node.detach(self.self_ptr());
        }
        binding
    }

    /// Install `binding`, replacing any previous one, and dirty the property
    /// and everything that depends on it.
    fn install_binding(&self, binding: Binding<T>) {
        self.remove_binding();
        let two_way = matches!(binding, Binding::TwoWay(_));
        *self.binding.borrow_mut() = Some(binding);
        self.node.toggle(HAS_BINDING, true);
        self.node.toggle(TWO_WAY, two_way);
        self.node.set_flags((self.node.flags() & STATUS_MASK) | DIRTY);
        tracing::debug!(two_way, "binding installed");

        if let Some(me) = self.self_ref.upgrade() {
            mark_dependents_dirty(me as Rc<dyn AnySource>);
        }
    }
}

impl<T> Drop for PropertyInner<T> {
    fn drop(&mut self) {
        self.node.detach(self as *const Self as *const ());
    }
}

// =============================================================================
// GRAPH TRAIT IMPLEMENTATIONS
// =============================================================================

impl<T: 'static> AnySource for PropertyInner<T> {
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

impl<T: 'static> AnyDependent for PropertyInner<T> {
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

    fn as_source(&self) -> Option<Rc<dyn AnySource>> {
        self.self_ref.upgrade().map(|me| me as Rc<dyn AnySource>)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// PROPERTY - Public API
// =============================================================================

/// A value cell that participates in dependency tracking.
///
/// Reading a property inside a binding or a [`PropertyTracker`](crate::PropertyTracker)
/// evaluation registers it as a dependency. Writing it dirties everything
/// that read it.
///
/// Cloning a `Property` yields another handle to the same property, which is
/// how bindings capture the properties they read.
///
/// # Example
///
/// ```
/// use spark_properties::Property;
///
/// let width = Property::new(2);
/// let height = Property::new(3);
/// let area = Property::new(0);
///
/// let (w, h) = (width.clone(), height.clone());
/// area.set_binding(move || w.get() * h.get());
/// assert_eq!(area.get(), 6);
///
/// width.set(10);
/// assert_eq!(area.get(), 30);
/// ```
pub struct Property<T> {
    inner: Rc<PropertyInner<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T: Clone + 'static> Property<T> {
    /// Create an unbound property holding `value`
    pub fn new(value: T) -> Self {
        Self { inner: PropertyInner::new(value) }
    }

    /// Get the current value, evaluating the binding first if it is dirty.
    ///
    /// Registers this property as a dependency of the evaluation in progress.
    ///
    /// # Panics
    ///
    /// Panics with "Recursion detected" if called from inside this property's
    /// own binding.
    pub fn get(&self) -> T {
        self.inner.update();
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        self.inner.value.borrow().clone()
    }

    /// Get the current value without registering a dependency.
    pub fn get_untracked(&self) -> T {
        self.inner.update();
        self.inner.value.borrow().clone()
    }

    /// Store `value`.
    ///
    /// Removes a plain binding. On a two-way linked property the value is
    /// written to the shared common property instead and the link survives.
    /// Dependents are always dirtied, even when the value is unchanged.
    pub fn set(&self, value: T) {
        self.inner.assert_not_evaluating();

        if let Some(common) = self.inner.two_way_common() {
            common.set(value);
            return;
        }

        if self.inner.remove_binding().is_some() {
            tracing::trace!("binding removed by direct write");
        }
        *self.inner.value.borrow_mut() = value;
        self.inner.node.set_flags((self.inner.node.flags() & STATUS_MASK) | CLEAN);
        mark_dependents_dirty(self.inner.clone() as Rc<dyn AnySource>);
    }

    /// Install a binding that computes the value on demand.
    ///
    /// The binding runs lazily on the next read. On a two-way linked property
    /// the binding is installed on the common property.
    pub fn set_binding(&self, binding: impl Fn() -> T + 'static) {
        self.inner.assert_not_evaluating();

        if let Some(common) = self.inner.two_way_common() {
            common.set_binding(binding);
            return;
        }

        self.inner.install_binding(Binding::Closure(Rc::new(binding)));
    }

    /// Check if a binding (plain or two-way) is installed
    pub fn has_binding(&self) -> bool {
        self.inner.node.flags() & HAS_BINDING != 0
    }

    /// Check if the binding must run again before the value is current
    pub fn is_dirty(&self) -> bool {
        self.inner.node.flags() & DIRTY != 0
    }

    /// Check if this property is linked two-way with another one
    pub fn is_two_way(&self) -> bool {
        self.inner.node.flags() & TWO_WAY != 0
    }

    /// Link two properties so that they always hold the same value.
    ///
    /// Both end up bound to a common property. If `prop1` was already linked,
    /// `prop2` joins its group, and so does every property already linked with
    /// `prop2`. In every case `prop2`'s value or binding becomes the shared
    /// state. Afterwards, `set` or `set_binding` on any member acts on the
    /// common property.
    ///
    /// # Example
    ///
    /// ```
    /// use spark_properties::Property;
    ///
    /// let a = Property::new(1);
    /// let b = Property::new(2);
    /// Property::link_two_way(&a, &b);
    /// assert_eq!(a.get(), 2);
    ///
    /// a.set(5);
    /// assert_eq!(b.get(), 5);
    /// ```
    pub fn link_two_way(prop1: &Self, prop2: &Self) {
        if prop1.ptr_eq(prop2) {
            return;
        }
        prop1.inner.assert_not_evaluating();
        prop2.inner.assert_not_evaluating();

        let common = match (prop1.inner.two_way_root(), prop2.inner.two_way_root()) {
            (Some(r1), Some(r2)) if r1.ptr_eq(&r2) => return,
            (Some(common), Some(other)) => {
                // Merge: prop2's group keeps its state and follows prop1's common property
                PropertyInner::move_state_onto(&common, &other);
                other.inner.install_binding(Binding::TwoWay(common.clone()));
                common
            }
            (Some(common), None) => {
                PropertyInner::move_state_onto(&common, prop2);
                common
            }
            (None, Some(common)) => common,
            (None, None) => {
                let common = Property::new(prop2.get_untracked());
                if let Some(Binding::Closure(f)) = prop2.inner.remove_binding() {
                    common.inner.install_binding(Binding::Closure(f));
                }
                common
            }
        };

        for prop in [prop1, prop2] {
            let linked = prop.inner.two_way_root().is_some_and(|c| c.ptr_eq(&common));
            if !linked {
                prop.inner.install_binding(Binding::TwoWay(common.clone()));
            }
        }
        tracing::debug!("properties linked two-way");
    }

    /// Dirty every dependent, as if the value had been written.
    ///
    /// For state a binding reads outside of any property.
    pub fn mark_dirty(&self) {
        mark_dependents_dirty(self.inner.clone() as Rc<dyn AnySource>);
    }

    /// Check if two handles refer to the same property
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Get the inner Rc (for advanced use)
    pub fn inner(&self) -> &Rc<PropertyInner<T>> {
        &self.inner
    }

    /// Get as a type-erased source
    pub fn as_any_source(&self) -> Rc<dyn AnySource> {
        self.inner.clone()
    }
}

impl<T: Clone + Default + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flags = self.inner.node.flags();
        let mut s = f.debug_struct("Property");
        match self.inner.value.try_borrow() {
            Ok(value) => s.field("value", &*value),
            Err(_) => s.field("value", &"<borrowed>"),
        };
        s.field("has_binding", &(flags & HAS_BINDING != 0))
            .field("dirty", &(flags & DIRTY != 0))
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
