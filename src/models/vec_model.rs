// ============================================================================
// spark-properties - VecModel
// A growable, editable model backed by a Vec
// ============================================================================

use std::any::Any;
use std::cell::RefCell;

use super::error::{ModelError, Result};
use super::notify::ModelNotify;
use super::{Model, ModelRc, ModelTracker};

// =============================================================================
// VEC MODEL
// =============================================================================

/// A [`Model`] backed by a `Vec<T>`.
///
/// Every mutation sends exactly the notification that describes it, after
/// the storage borrow is released, so listeners may read the model.
///
/// # Example
///
/// ```
/// use spark_properties::{Model, VecModel};
///
/// let model = VecModel::from(vec![1, 2, 3]);
/// model.push(4);
/// model.remove(0);
/// assert_eq!(model.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
/// ```
pub struct VecModel<T> {
    array: RefCell<Vec<T>>,
    notify: ModelNotify,
}

impl<T> Default for VecModel<T> {
    fn default() -> Self {
        Self { array: RefCell::new(Vec::new()), notify: ModelNotify::default() }
    }
}

impl<T: 'static> VecModel<T> {
    /// Create a shared model from a slice
    pub fn from_slice(slice: &[T]) -> ModelRc<T>
    where
        T: Clone,
    {
        ModelRc::new(Self::from(slice.to_vec()))
    }

    /// Append a row. Notifies `row_added(len - 1, 1)`.
    pub fn push(&self, value: T) {
        let index = {
            let mut array = self.array.borrow_mut();
            array.push(value);
            array.len() - 1
        };
        self.notify.row_added(index, 1);
    }

    /// Insert a row at `index`. Notifies `row_added(index, 1)`.
    ///
    /// # Panics
    ///
    /// Panics if `index > row_count()`.
    pub fn insert(&self, index: usize, value: T) {
        self.array.borrow_mut().insert(index, value);
        self.notify.row_added(index, 1);
    }

    /// Like [`insert`](Self::insert), failing instead of panicking
    pub fn try_insert(&self, index: usize, value: T) -> Result<()> {
        let len = self.array.borrow().len();
        if index > len {
            return Err(ModelError::InsertOutOfRange { index, len });
        }
        self.insert(index, value);
        Ok(())
    }

    /// Remove and return the row at `index`. Notifies `row_removed(index, 1)`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= row_count()`.
    pub fn remove(&self, index: usize) -> T {
        let removed = self.array.borrow_mut().remove(index);
        self.notify.row_removed(index, 1);
        removed
    }

    /// Like [`remove`](Self::remove), failing instead of panicking
    pub fn try_remove(&self, index: usize) -> Result<T> {
        let len = self.array.borrow().len();
        if index >= len {
            return Err(ModelError::IndexOutOfRange { index, len });
        }
        Ok(self.remove(index))
    }

    /// Remove up to `count` rows starting at `index`, clamped to the model.
    ///
    /// Returns how many rows were removed and notifies a single
    /// `row_removed` for them (nothing if none).
    pub fn remove_range(&self, index: usize, count: usize) -> usize {
        let removed = {
            let mut array = self.array.borrow_mut();
            let start = index.min(array.len());
            let end = index.saturating_add(count).min(array.len());
            array.drain(start..end).count()
        };
        if removed > 0 {
            self.notify.row_removed(index, removed);
        }
        removed
    }

    /// Swap rows `a` and `b`. Notifies `row_changed` for both.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn swap(&self, a: usize, b: usize) {
        self.array.borrow_mut().swap(a, b);
        if a != b {
            self.notify.row_changed(a);
            self.notify.row_changed(b);
        }
    }

    /// Replace the whole content. Notifies `reset()`.
    pub fn set_vec(&self, new: impl Into<Vec<T>>) {
        *self.array.borrow_mut() = new.into();
        tracing::debug!(rows = self.array.borrow().len(), "vec model replaced");
        self.notify.reset();
    }

    /// Remove every row. Notifies `reset()`.
    pub fn clear(&self) {
        self.array.borrow_mut().clear();
        self.notify.reset();
    }

    /// Append rows. Notifies a single `row_added` (nothing if `iter` is empty).
    pub fn extend<I: IntoIterator<Item = T>>(&self, iter: I) {
        let (index, count) = {
            let mut array = self.array.borrow_mut();
            let old_len = array.len();
            array.extend(iter);
            (old_len, array.len() - old_len)
        };
        if count > 0 {
            self.notify.row_added(index, count);
        }
    }

    /// Append clones of `src`. Notifies a single `row_added` (nothing if empty).
    pub fn extend_from_slice(&self, src: &[T])
    where
        T: Clone,
    {
        self.extend(src.iter().cloned());
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.array.borrow().len()
    }

    /// Check if the model has no rows
    pub fn is_empty(&self) -> bool {
        self.array.borrow().is_empty()
    }

    /// Run `f` with read access to the rows
    pub fn with_rows<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.array.borrow())
    }
}

impl<T> From<Vec<T>> for VecModel<T> {
    fn from(array: Vec<T>) -> Self {
        Self { array: RefCell::new(array), notify: ModelNotify::default() }
    }
}

impl<T> FromIterator<T> for VecModel<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<T: Clone + 'static> Model for VecModel<T> {
    type Data = T;

    fn row_count(&self) -> usize {
        self.array.borrow().len()
    }

    fn row_data(&self, row: usize) -> Option<Self::Data> {
        self.array.borrow().get(row).cloned()
    }

    fn set_row_data(&self, row: usize, data: Self::Data) {
        let written = match self.array.borrow_mut().get_mut(row) {
            Some(slot) => {
                *slot = data;
                true
            }
            None => false,
        };
        if written {
            self.notify.row_changed(row);
        } else {
            tracing::trace!(row, "set_row_data out of range ignored");
        }
    }

    fn model_tracker(&self) -> &dyn ModelTracker {
        &self.notify
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for VecModel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VecModel")
            .field("rows", &*self.array.borrow())
            .field("notify", &self.notify)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notify::{ModelChangeListener, ModelPeer};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl ModelChangeListener for Recorder {
        fn row_changed(&self, row: usize) {
            self.events.borrow_mut().push(format!("changed {row}"));
        }
        fn row_added(&self, index: usize, count: usize) {
            self.events.borrow_mut().push(format!("added {index} {count}"));
        }
        fn row_removed(&self, index: usize, count: usize) {
            self.events.borrow_mut().push(format!("removed {index} {count}"));
        }
        fn reset(&self) {
            self.events.borrow_mut().push("reset".into());
        }
    }

    fn observed(model: &VecModel<i32>) -> Rc<Recorder> {
        let recorder = Rc::new(Recorder::default());
        model.model_tracker().attach_peer(ModelPeer::new(&recorder));
        recorder
    }

    #[test]
    fn mutations_emit_matching_events() {
        let model = VecModel::from(vec![1, 2, 3]);
        let recorder = observed(&model);

        model.push(4);
        model.insert(0, 0);
        model.remove(1);
        model.set_row_data(0, 10);
        model.set_row_data(99, 10);
        model.swap(0, 1);
        model.clear();

        assert_eq!(
            *recorder.events.borrow(),
            vec!["added 3 1", "added 0 1", "removed 1 1", "changed 0", "changed 0", "changed 1", "reset"]
        );
    }

    #[test]
    fn extend_emits_single_event() {
        let model = VecModel::from(vec![1]);
        let recorder = observed(&model);

        model.extend([2, 3, 4]);
        model.extend_from_slice(&[]);
        model.extend_from_slice(&[5]);

        assert_eq!(*recorder.events.borrow(), vec!["added 1 3", "added 4 1"]);
        assert_eq!(model.len(), 5);
    }

    #[test]
    fn remove_range_is_clamped() {
        let model = VecModel::from(vec![1, 2, 3, 4]);
        let recorder = observed(&model);

        assert_eq!(model.remove_range(2, 10), 2);
        assert_eq!(model.remove_range(5, 1), 0);

        assert_eq!(*recorder.events.borrow(), vec!["removed 2 2"]);
        assert_eq!(model.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn checked_operations_report_bounds() {
        let model = VecModel::from(vec![1, 2]);
        assert_eq!(model.try_remove(2), Err(ModelError::IndexOutOfRange { index: 2, len: 2 }));
        assert_eq!(model.try_insert(3, 0), Err(ModelError::InsertOutOfRange { index: 3, len: 2 }));
        assert_eq!(model.try_insert(2, 3), Ok(()));
        assert_eq!(model.try_remove(0), Ok(1));
        assert_eq!(model.iter().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn set_vec_resets() {
        let model = VecModel::from(vec![1]);
        let recorder = observed(&model);
        model.set_vec(vec![7, 8]);
        assert_eq!(*recorder.events.borrow(), vec!["reset"]);
        assert_eq!(model.row_data(1), Some(8));
    }

    #[test]
    fn listener_can_read_model_during_notification() {
        struct Reader {
            model: Rc<VecModel<i32>>,
            seen: RefCell<Vec<i32>>,
        }
        impl ModelChangeListener for Reader {
            fn row_changed(&self, _row: usize) {}
            fn row_added(&self, index: usize, _count: usize) {
                let value = self.model.row_data(index).unwrap_or_default();
                self.seen.borrow_mut().push(value);
            }
            fn row_removed(&self, _index: usize, _count: usize) {}
            fn reset(&self) {}
        }

        let model = Rc::new(VecModel::<i32>::default());
        let reader = Rc::new(Reader { model: model.clone(), seen: RefCell::new(Vec::new()) });
        model.model_tracker().attach_peer(ModelPeer::new(&reader));

        model.push(5);
        assert_eq!(*reader.seen.borrow(), vec![5]);
    }

    #[test]
    fn from_slice_shares_rows() {
        let model = VecModel::from_slice(&[1, 2]);
        assert_eq!(model.row_count(), 2);
        assert!(model.as_any().downcast_ref::<VecModel<i32>>().is_some());
    }
}
