// ============================================================================
// spark-properties - Model Notify
// Change broadcasting for models: listeners, peers, and dependency tracking
// ============================================================================

use std::cell::{OnceCell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use super::ModelTracker;
use crate::core::context::is_tracking;
use crate::primitives::property::Property;

// =============================================================================
// LISTENER AND PEER
// =============================================================================

/// Receives the change notifications of a model.
///
/// Every notification describes the model's state right after the change.
pub trait ModelChangeListener {
    /// The data of `row` changed
    fn row_changed(&self, row: usize);

    /// `count` rows were inserted, the first one now at `index`
    fn row_added(&self, index: usize, count: usize);

    /// `count` rows starting at `index` were removed
    fn row_removed(&self, index: usize, count: usize);

    /// Anything may have changed
    fn reset(&self);
}

/// A weak handle to a [`ModelChangeListener`].
///
/// A model never keeps its listeners alive. Peers whose listener was dropped
/// are skipped and pruned on the next notification.
#[derive(Clone)]
pub struct ModelPeer {
    inner: Weak<dyn ModelChangeListener>,
}

impl ModelPeer {
    /// Create a peer for `listener`
    pub fn new<L: ModelChangeListener + 'static>(listener: &Rc<L>) -> Self {
        let inner: Weak<dyn ModelChangeListener> = Rc::downgrade(listener) as Weak<dyn ModelChangeListener>;
        Self { inner }
    }

    /// Check if the listener still exists
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    fn same_listener(&self, other: &ModelPeer) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for ModelPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelPeer").field("alive", &self.is_alive()).finish()
    }
}

// =============================================================================
// DEPENDENCY TRACKING STATE
// =============================================================================

/// Created on first tracked access, so models nobody binds to pay nothing.
struct TrackedState {
    /// Written whenever the number of rows may have changed
    row_count_dirty: Property<()>,

    /// Written whenever a tracked row may have changed
    row_data_dirty: Property<()>,

    /// Rows read through `track_row_data_changes` since the last invalidation
    tracked_rows: RefCell<Vec<usize>>,
}

impl TrackedState {
    fn new() -> Self {
        Self {
            row_count_dirty: Property::new(()),
            row_data_dirty: Property::new(()),
            tracked_rows: RefCell::new(Vec::new()),
        }
    }

    fn invalidate_structure(&self) {
        self.tracked_rows.borrow_mut().clear();
        self.row_count_dirty.set(());
        self.row_data_dirty.set(());
    }

    fn invalidate_row(&self, row: usize) {
        let tracked = self.tracked_rows.borrow().binary_search(&row).is_ok();
        if tracked {
            self.tracked_rows.borrow_mut().clear();
            self.row_data_dirty.set(());
        }
    }
}

// =============================================================================
// MODEL NOTIFY
// =============================================================================

/// The change-broadcasting part of a model.
///
/// A model embeds one, returns it from [`Model::model_tracker`](super::Model::model_tracker),
/// and calls `row_changed`/`row_added`/`row_removed`/`reset` after every
/// change. Each call reaches every live attached peer and dirties the
/// bindings and trackers that read the affected rows or the row count.
#[derive(Default)]
pub struct ModelNotify {
    peers: RefCell<SmallVec<[ModelPeer; 2]>>,
    tracked: OnceCell<TrackedState>,
}

impl ModelNotify {
    /// Notify that the data of `row` changed
    pub fn row_changed(&self, row: usize) {
        tracing::trace!(row, "row_changed");
        if let Some(tracked) = self.tracked.get() {
            tracked.invalidate_row(row);
        }
        self.for_each_listener(|listener| listener.row_changed(row));
    }

    /// Notify that `count` rows were inserted at `index`
    pub fn row_added(&self, index: usize, count: usize) {
        tracing::trace!(index, count, "row_added");
        if let Some(tracked) = self.tracked.get() {
            tracked.invalidate_structure();
        }
        self.for_each_listener(|listener| listener.row_added(index, count));
    }

    /// Notify that `count` rows starting at `index` were removed
    pub fn row_removed(&self, index: usize, count: usize) {
        tracing::trace!(index, count, "row_removed");
        if let Some(tracked) = self.tracked.get() {
            tracked.invalidate_structure();
        }
        self.for_each_listener(|listener| listener.row_removed(index, count));
    }

    /// Notify that the whole model may have changed
    pub fn reset(&self) {
        tracing::trace!("reset");
        if let Some(tracked) = self.tracked.get() {
            tracked.invalidate_structure();
        }
        self.for_each_listener(|listener| listener.reset());
    }

    /// Number of attached peers whose listener is still alive
    pub fn peer_count(&self) -> usize {
        self.peers.borrow().iter().filter(|peer| peer.is_alive()).count()
    }

    /// Deliver to a snapshot of the live listeners.
    ///
    /// Peers attached during delivery get the next notification, not this one.
    fn for_each_listener(&self, mut f: impl FnMut(&dyn ModelChangeListener)) {
        let listeners: SmallVec<[Rc<dyn ModelChangeListener>; 2]> = {
            let mut peers = self.peers.borrow_mut();
            peers.retain(|peer| peer.is_alive());
            peers.iter().filter_map(|peer| peer.inner.upgrade()).collect()
        };
        for listener in listeners {
            f(&*listener);
        }
    }

    fn tracked(&self) -> &TrackedState {
        self.tracked.get_or_init(TrackedState::new)
    }
}

impl ModelTracker for ModelNotify {
    fn attach_peer(&self, peer: ModelPeer) {
        let mut peers = self.peers.borrow_mut();
        if !peers.iter().any(|p| p.same_listener(&peer)) {
            peers.push(peer);
        }
    }

    fn track_row_count_changes(&self) {
        if is_tracking() {
            self.tracked().row_count_dirty.get();
        }
    }

    fn track_row_data_changes(&self, row: usize) {
        if is_tracking() {
            let tracked = self.tracked();
            {
                let mut rows = tracked.tracked_rows.borrow_mut();
                if let Err(pos) = rows.binary_search(&row) {
                    rows.insert(pos, row);
                }
            }
            tracked.row_data_dirty.get();
        }
    }
}

impl std::fmt::Debug for ModelNotify {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelNotify")
            .field("peers", &self.peer_count())
            .field("tracking", &self.tracked.get().is_some())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PropertyTracker;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counter {
        events: Cell<usize>,
    }

    impl ModelChangeListener for Counter {
        fn row_changed(&self, _row: usize) {
            self.events.set(self.events.get() + 1);
        }
        fn row_added(&self, _index: usize, _count: usize) {
            self.events.set(self.events.get() + 1);
        }
        fn row_removed(&self, _index: usize, _count: usize) {
            self.events.set(self.events.get() + 1);
        }
        fn reset(&self) {
            self.events.set(self.events.get() + 1);
        }
    }

    #[test]
    fn peers_are_weak_and_pruned() {
        let notify = ModelNotify::default();
        let listener = Rc::new(Counter::default());
        notify.attach_peer(ModelPeer::new(&listener));
        notify.attach_peer(ModelPeer::new(&listener));
        assert_eq!(notify.peer_count(), 1);

        notify.row_added(0, 1);
        assert_eq!(listener.events.get(), 1);

        drop(listener);
        assert_eq!(notify.peer_count(), 0);
        notify.reset();
        assert!(notify.peers.borrow().is_empty());
    }

    #[test]
    fn row_count_tracking() {
        let notify = ModelNotify::default();
        let tracker = PropertyTracker::new();
        tracker.evaluate(|| notify.track_row_count_changes());

        notify.row_changed(0);
        assert!(!tracker.is_dirty());

        notify.row_removed(0, 1);
        assert!(tracker.is_dirty());
    }

    #[test]
    fn row_data_tracking_is_per_row() {
        let notify = ModelNotify::default();
        let tracker = PropertyTracker::new();
        tracker.evaluate(|| notify.track_row_data_changes(2));

        notify.row_changed(1);
        assert!(!tracker.is_dirty());

        notify.row_changed(2);
        assert!(tracker.is_dirty());
    }

    #[test]
    fn untracked_access_allocates_nothing() {
        let notify = ModelNotify::default();
        notify.track_row_count_changes();
        notify.track_row_data_changes(0);
        assert!(notify.tracked.get().is_none());
    }
}
