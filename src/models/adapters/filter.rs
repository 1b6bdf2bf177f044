// ============================================================================
// spark-properties - FilterModel
// Presents the upstream rows accepted by a predicate, in upstream order
// ============================================================================

use std::any::Any;
use std::rc::Rc;
use std::cell::RefCell;

use crate::models::{Model, ModelChangeListener, ModelNotify, ModelPeer, ModelRc, ModelTracker};

// =============================================================================
// FILTER MODEL INNER
// =============================================================================

struct FilterModelInner<T> {
    wrapped_model: ModelRc<T>,
    filter_function: Box<dyn Fn(&T) -> bool>,
    /// Upstream index of each visible row, strictly increasing
    mapping: RefCell<Vec<usize>>,
    notify: ModelNotify,
}

impl<T: 'static> FilterModelInner<T> {
    fn accepts(&self, row: usize) -> bool {
        self.wrapped_model.row_data(row).is_some_and(|data| (self.filter_function)(&data))
    }

    fn build_mapping_vec(&self) {
        let mapping: Vec<usize> = (0..self.wrapped_model.row_count())
            .filter(|&row| self.accepts(row))
            .collect();
        tracing::debug!(visible = mapping.len(), "filter mapping rebuilt");
        *self.mapping.borrow_mut() = mapping;
    }
}

impl<T: 'static> ModelChangeListener for FilterModelInner<T> {
    fn row_changed(&self, row: usize) {
        enum Outcome {
            Changed(usize),
            Added(usize),
            Removed(usize),
            Unaffected,
        }

        let should_be_contained = self.accepts(row);
        let outcome = {
            let mut mapping = self.mapping.borrow_mut();
            match (mapping.binary_search(&row), should_be_contained) {
                (Ok(index), true) => Outcome::Changed(index),
                (Ok(index), false) => {
                    mapping.remove(index);
                    Outcome::Removed(index)
                }
                (Err(index), true) => {
                    mapping.insert(index, row);
                    Outcome::Added(index)
                }
                (Err(_), false) => Outcome::Unaffected,
            }
        };

        match outcome {
            Outcome::Changed(index) => self.notify.row_changed(index),
            Outcome::Added(index) => self.notify.row_added(index, 1),
            Outcome::Removed(index) => self.notify.row_removed(index, 1),
            Outcome::Unaffected => {}
        }
    }

    fn row_added(&self, index: usize, count: usize) {
        if count == 0 {
            return;
        }

        let insertion: Vec<usize> = (index..index + count).filter(|&row| self.accepts(row)).collect();

        let insertion_point = {
            let mut mapping = self.mapping.borrow_mut();
            let insertion_point = mapping.partition_point(|&row| row < index);
            // Rows after the insertion moved down even if none of the new ones is visible
            mapping[insertion_point..].iter_mut().for_each(|row| *row += count);
            mapping.splice(insertion_point..insertion_point, insertion.iter().copied());
            insertion_point
        };

        if !insertion.is_empty() {
            self.notify.row_added(insertion_point, insertion.len());
        }
    }

    fn row_removed(&self, index: usize, count: usize) {
        if count == 0 {
            return;
        }

        let (start, removed) = {
            let mut mapping = self.mapping.borrow_mut();
            let start = mapping.partition_point(|&row| row < index);
            let end = mapping.partition_point(|&row| row < index + count);
            mapping.drain(start..end);
            mapping[start..].iter_mut().for_each(|row| *row -= count);
            (start, end - start)
        };

        if removed > 0 {
            self.notify.row_removed(start, removed);
        }
    }

    fn reset(&self) {
        self.build_mapping_vec();
        self.notify.reset();
    }
}

// =============================================================================
// FILTER MODEL - Public API
// =============================================================================

/// A model with the upstream rows for which a predicate holds.
///
/// The filtered rows keep their upstream order. The predicate is evaluated
/// again for a row whenever the upstream reports it changed; call
/// [`reset`](Self::reset) after changing what the predicate depends on.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use spark_properties::{Model, ModelExt, VecModel};
///
/// let numbers = Rc::new(VecModel::from(vec![1, 2, 3, 4]));
/// let even = numbers.clone().filter(|n| n % 2 == 0);
/// assert_eq!(even.iter().collect::<Vec<_>>(), vec![2, 4]);
///
/// numbers.push(6);
/// assert_eq!(even.row_count(), 3);
/// ```
pub struct FilterModel<T>(Rc<FilterModelInner<T>>);

impl<T: 'static> FilterModel<T> {
    /// Present the rows of `wrapped_model` accepted by `filter_function`
    pub fn new<M, F>(wrapped_model: M, filter_function: F) -> Self
    where
        M: Model<Data = T> + 'static,
        F: Fn(&T) -> bool + 'static,
    {
        let inner = Rc::new(FilterModelInner {
            wrapped_model: ModelRc::new(wrapped_model),
            filter_function: Box::new(filter_function),
            mapping: RefCell::new(Vec::new()),
            notify: ModelNotify::default(),
        });

        inner.build_mapping_vec();
        inner.wrapped_model.model_tracker().attach_peer(ModelPeer::new(&inner));

        Self(inner)
    }

    /// Evaluate the predicate again for every row. Notifies `reset()`.
    pub fn reset(&self) {
        self.0.reset();
    }

    /// Alias of [`reset`](Self::reset), for when the predicate's inputs changed
    pub fn apply_filter(&self) {
        self.0.reset();
    }

    /// The upstream row presented at `filtered_row`.
    ///
    /// # Panics
    ///
    /// Panics if `filtered_row >= row_count()`.
    pub fn unfiltered_row(&self, filtered_row: usize) -> usize {
        self.0.mapping.borrow()[filtered_row]
    }

    /// The model being filtered
    pub fn source_model(&self) -> &ModelRc<T> {
        &self.0.wrapped_model
    }
}

impl<T: 'static> Model for FilterModel<T> {
    type Data = T;

    fn row_count(&self) -> usize {
        self.0.mapping.borrow().len()
    }

    fn row_data(&self, row: usize) -> Option<Self::Data> {
        let source_row = self.0.mapping.borrow().get(row).copied()?;
        self.0.wrapped_model.row_data(source_row)
    }

    /// Writes to the upstream row; the upstream notification then updates this model.
    fn set_row_data(&self, row: usize, data: Self::Data) {
        let source_row = self.0.mapping.borrow().get(row).copied();
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
