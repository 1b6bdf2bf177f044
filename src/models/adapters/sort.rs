// ============================================================================
// spark-properties - SortModel
// Presents the upstream rows ordered by a comparison function
// ============================================================================

use std::any::Any;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::models::{Model, ModelChangeListener, ModelNotify, ModelPeer, ModelRc, ModelTracker};

// =============================================================================
// SORT MODEL INNER
// =============================================================================

struct SortModelInner<T> {
    wrapped_model: ModelRc<T>,
    sort_function: Box<dyn Fn(&T, &T) -> Ordering>,
    /// Upstream index of each sorted row, with the value it was sorted by
    mapping: RefCell<Vec<(usize, T)>>,
    notify: ModelNotify,
}

impl<T: 'static> SortModelInner<T> {
    /// Where upstream row `row` holding `value` belongs in the mapping.
    ///
    /// Equal values keep their upstream order, which makes the order total.
    /// Entries compare by the value they were placed with, so the mapping
    /// stays sorted while later notifications of a batch are still pending.
    fn insertion_point(&self, value: &T, row: usize) -> usize {
        self.mapping.borrow().partition_point(|(existing, existing_value)| {
            (self.sort_function)(existing_value, value).then(existing.cmp(&row)) == Ordering::Less
        })
    }

    fn build_mapping_vec(&self) {
        let mut rows: Vec<(usize, T)> = self.wrapped_model.iter().enumerate().collect();
        rows.sort_by(|(a_row, a), (b_row, b)| (self.sort_function)(a, b).then(a_row.cmp(b_row)));
        tracing::debug!(rows = rows.len(), "sort mapping rebuilt");
        *self.mapping.borrow_mut() = rows;
    }
}

impl<T: 'static> ModelChangeListener for SortModelInner<T> {
    fn row_changed(&self, row: usize) {
        let position = self.mapping.borrow().iter().position(|(existing, _)| *existing == row);
        let Some(old_position) = position else {
            // Out of sync with upstream: start over
            self.reset();
            return;
        };
        self.mapping.borrow_mut().remove(old_position);

        let Some(value) = self.wrapped_model.row_data(row) else {
            self.notify.row_removed(old_position, 1);
            return;
        };

        let new_position = self.insertion_point(&value, row);
        if new_position == old_position {
            self.mapping.borrow_mut().insert(new_position, (row, value));
            self.notify.row_changed(new_position);
        } else {
            // A move: each step is announced against a consistent mapping
            self.notify.row_removed(old_position, 1);
            self.mapping.borrow_mut().insert(new_position, (row, value));
            self.notify.row_added(new_position, 1);
        }
    }

    fn row_added(&self, index: usize, count: usize) {
        if count == 0 {
            return;
        }

        self.mapping
            .borrow_mut()
            .iter_mut()
            .filter(|(existing, _)| *existing >= index)
            .for_each(|(existing, _)| *existing += count);

        for row in index..index + count {
            let Some(value) = self.wrapped_model.row_data(row) else {
                continue;
            };
            let position = self.insertion_point(&value, row);
            self.mapping.borrow_mut().insert(position, (row, value));
            self.notify.row_added(position, 1);
        }
    }

    fn row_removed(&self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let removed_range = index..index + count;

        let positions: Vec<usize> = {
            let mut mapping = self.mapping.borrow_mut();
            let positions = mapping
                .iter()
                .enumerate()
                .filter(|(_, (existing, _))| removed_range.contains(existing))
                .map(|(position, _)| position)
                .collect();
            mapping.retain(|(existing, _)| !removed_range.contains(existing));
            mapping
                .iter_mut()
                .filter(|(existing, _)| *existing >= removed_range.end)
                .for_each(|(existing, _)| *existing -= count);
            positions
        };

        let (Some(&first), Some(&last)) = (positions.first(), positions.last()) else {
            return;
        };
        if last - first + 1 == positions.len() {
            self.notify.row_removed(first, positions.len());
        } else {
            tracing::debug!(removed = positions.len(), "scattered sorted removal, resetting");
            self.notify.reset();
        }
    }

    fn reset(&self) {
        self.build_mapping_vec();
        self.notify.reset();
    }
}

// =============================================================================
// SORT MODEL - Public API
// =============================================================================

/// A model with the upstream rows in sorted order.
///
/// Rows that compare equal keep their upstream order. When an upstream row
/// changes, it moves to its new position, announced as a removal followed by
/// an insertion.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use spark_properties::{Model, ModelExt, VecModel};
///
/// let scores = Rc::new(VecModel::from(vec![30, 10, 20]));
/// let ranked = scores.clone().sort_by(|a, b| b.cmp(a));
/// assert_eq!(ranked.iter().collect::<Vec<_>>(), vec![30, 20, 10]);
///
/// scores.push(25);
/// assert_eq!(ranked.row_data(1), Some(25));
/// ```
pub struct SortModel<T>(Rc<SortModelInner<T>>);

impl<T: 'static> SortModel<T> {
    /// Present the rows of `wrapped_model` ordered by `sort_function`
    pub fn new<M, F>(wrapped_model: M, sort_function: F) -> Self
    where
        M: Model<Data = T> + 'static,
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        let inner = Rc::new(SortModelInner {
            wrapped_model: ModelRc::new(wrapped_model),
            sort_function: Box::new(sort_function),
            mapping: RefCell::new(Vec::new()),
            notify: ModelNotify::default(),
        });

        inner.build_mapping_vec();
        inner.wrapped_model.model_tracker().attach_peer(ModelPeer::new(&inner));

        Self(inner)
    }

    /// Present the rows of `wrapped_model` in ascending order
    pub fn new_ascending<M>(wrapped_model: M) -> Self
    where
        M: Model<Data = T> + 'static,
        T: Ord,
    {
        Self::new(wrapped_model, T::cmp)
    }

    /// Sort every row again. Notifies `reset()`.
    pub fn reset(&self) {
        self.0.reset();
    }

    /// Alias of [`reset`](Self::reset), for when the comparison's inputs changed
    pub fn apply_sorting(&self) {
        self.0.reset();
    }

    /// The upstream row presented at `sorted_row`.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_row >= row_count()`.
    pub fn unsorted_row(&self, sorted_row: usize) -> usize {
        self.0.mapping.borrow()[sorted_row].0
    }

    /// The model being sorted
    pub fn source_model(&self) -> &ModelRc<T> {
        &self.0.wrapped_model
    }
}

impl<T: 'static> Model for SortModel<T> {
    type Data = T;

    fn row_count(&self) -> usize {
        self.0.mapping.borrow().len()
    }

    fn row_data(&self, row: usize) -> Option<Self::Data> {
        let source_row = self.0.mapping.borrow().get(row).map(|(source_row, _)| *source_row)?;
        self.0.wrapped_model.row_data(source_row)
    }

    /// Writes to the upstream row; the upstream notification then moves it if needed.
    fn set_row_data(&self, row: usize, data: Self::Data) {
        let source_row = self.0.mapping.borrow().get(row).map(|(source_row, _)| *source_row);
        match source_row {
            Some(source_row) => self.0.wrapped_model.set_row_data(source_row, data),
            None => tracing::trace!(row, "set_row_data out of range ignored"),
        }
    }

    fn model_tracker(&self) -> &dyn ModelTracker {
        &self.0.notify
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
