// ============================================================================
// spark-properties - Models Module
// Observable row-indexed data sources and the traits that connect them
// ============================================================================
//
// A model is a list of rows that announces structural changes to attached
// listeners (ModelPeer) and, through ModelNotify, to property bindings and
// trackers that read it.
// ============================================================================

use std::any::Any;
use std::cmp::Ordering;
use std::rc::Rc;

pub mod adapters;
pub mod error;
pub mod notify;
pub mod vec_model;

pub use adapters::{FilterModel, MapModel, SortModel};
pub use error::ModelError;
pub use notify::{ModelChangeListener, ModelNotify, ModelPeer};
pub use vec_model::VecModel;

// =============================================================================
// MODEL TRACKER
// =============================================================================

/// The notification side of a model.
pub trait ModelTracker {
    /// Attach a listener that receives every change notification
    fn attach_peer(&self, peer: ModelPeer);

    /// Register the evaluation in progress as depending on the row count
    fn track_row_count_changes(&self);

    /// Register the evaluation in progress as depending on the data of `row`
    fn track_row_data_changes(&self, row: usize);
}

/// The tracker of models that never change.
impl ModelTracker for () {
    fn attach_peer(&self, _peer: ModelPeer) {}

    fn track_row_count_changes(&self) {}

    fn track_row_data_changes(&self, _row: usize) {}
}

// =============================================================================
// MODEL
// =============================================================================

/// A row-indexed, observable data source.
///
/// Implementors own a [`ModelNotify`] and call it after every change, with
/// all internal borrows released.
pub trait Model {
    /// The type of one row
    type Data;

    /// Number of rows
    fn row_count(&self) -> usize;

    /// Data of `row`, or `None` if `row >= row_count()`
    fn row_data(&self, row: usize) -> Option<Self::Data>;

    /// Write `data` to `row`.
    ///
    /// Read-only models ignore the write. Out-of-range writes are ignored.
    fn set_row_data(&self, row: usize, data: Self::Data) {
        let _ = data;
        tracing::trace!(row, "set_row_data ignored by read-only model");
    }

    /// The notification side of this model
    fn model_tracker(&self) -> &dyn ModelTracker;

    /// Iterate the rows from first to last
    fn iter(&self) -> ModelIterator<'_, Self::Data>
    where
        Self: Sized,
    {
        ModelIterator::new(self)
    }

    /// Access the concrete model behind a `ModelRc` or `dyn Model`
    fn as_any(&self) -> &dyn Any {
        &()
    }
}

// =============================================================================
// MODEL EXT
// =============================================================================

/// Combinators available on every model.
pub trait ModelExt: Model {
    /// Like [`Model::row_data`], additionally registering the evaluation in
    /// progress as depending on that row.
    fn row_data_tracked(&self, row: usize) -> Option<Self::Data> {
        self.model_tracker().track_row_data_changes(row);
        self.row_data(row)
    }

    /// A model whose rows are `map_function` applied to this model's rows
    fn map<F, U>(self, map_function: F) -> MapModel<Self::Data, U>
    where
        Self: Sized + 'static,
        Self::Data: 'static,
        U: 'static,
        F: Fn(Self::Data) -> U + 'static,
    {
        MapModel::new(self, map_function)
    }

    /// A model with only the rows for which `filter_function` returns true
    fn filter<F>(self, filter_function: F) -> FilterModel<Self::Data>
    where
        Self: Sized + 'static,
        Self::Data: 'static,
        F: Fn(&Self::Data) -> bool + 'static,
    {
        FilterModel::new(self, filter_function)
    }

    /// A model with this model's rows in ascending order
    fn sort(self) -> SortModel<Self::Data>
    where
        Self: Sized + 'static,
        Self::Data: Ord + 'static,
    {
        SortModel::new_ascending(self)
    }

    /// A model with this model's rows ordered by `sort_function`
    fn sort_by<F>(self, sort_function: F) -> SortModel<Self::Data>
    where
        Self: Sized + 'static,
        Self::Data: 'static,
        F: Fn(&Self::Data, &Self::Data) -> Ordering + 'static,
    {
        SortModel::new(self, sort_function)
    }
}

impl<T: Model + ?Sized> ModelExt for T {}

// =============================================================================
// MODEL ITERATOR
// =============================================================================

/// Iterator over the rows of a model
pub struct ModelIterator<'a, T> {
    model: &'a dyn Model<Data = T>,
    row: usize,
}

impl<'a, T> ModelIterator<'a, T> {
    /// Iterate `model` from its first row
    pub fn new(model: &'a dyn Model<Data = T>) -> Self {
        Self { model, row: 0 }
    }
}

impl<T> Iterator for ModelIterator<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.row;
        if row < self.model.row_count() {
            self.row += 1;
            self.model.row_data(row)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.model.row_count().saturating_sub(self.row);
        (len, Some(len))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.row = self.row.saturating_add(n);
        self.next()
    }
}

impl<T> ExactSizeIterator for ModelIterator<'_, T> {}

// =============================================================================
// BLANKET AND BUILT-IN MODELS
// =============================================================================

impl<M: Model> Model for Rc<M> {
    type Data = M::Data;

    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn row_data(&self, row: usize) -> Option<Self::Data> {
        (**self).row_data(row)
    }

    fn set_row_data(&self, row: usize, data: Self::Data) {
        (**self).set_row_data(row, data)
    }

    fn model_tracker(&self) -> &dyn ModelTracker {
        (**self).model_tracker()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }
}

/// A model of `n` rows whose data is the row index.
impl Model for usize {
    type Data = i32;

    fn row_count(&self) -> usize {
        *self
    }

    fn row_data(&self, row: usize) -> Option<Self::Data> {
        (row < self.row_count()).then_some(row as i32)
    }

    fn model_tracker(&self) -> &dyn ModelTracker {
        &()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A model with a single `()` row when true, no rows when false.
impl Model for bool {
    type Data = ();

    fn row_count(&self) -> usize {
        usize::from(*self)
    }

    fn row_data(&self, row: usize) -> Option<Self::Data> {
        (row < self.row_count()).then_some(())
    }

    fn model_tracker(&self) -> &dyn ModelTracker {
        &()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// MODEL RC
// =============================================================================

/// A shared, type-erased handle to a model, or no model at all.
///
/// Two handles are equal when they point to the same model.
pub struct ModelRc<T>(Option<Rc<dyn Model<Data = T>>>);

impl<T> ModelRc<T> {
    /// Wrap `model`
    pub fn new(model: impl Model<Data = T> + 'static) -> Self {
        Self(Some(Rc::new(model)))
    }

    /// Check if this handle has no model
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// The wrapped model, if any
    pub fn as_rc(&self) -> Option<&Rc<dyn Model<Data = T>>> {
        self.0.as_ref()
    }
}

impl<T> Clone for ModelRc<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for ModelRc<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> PartialEq for ModelRc<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }
}

impl<T> std::fmt::Debug for ModelRc<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModelRc(rows: {})", self.row_count())
    }
}

impl<T, M: Model<Data = T> + 'static> From<Rc<M>> for ModelRc<T> {
    fn from(model: Rc<M>) -> Self {
        Self(Some(model))
    }
}

impl<T> From<Rc<dyn Model<Data = T>>> for ModelRc<T> {
    fn from(model: Rc<dyn Model<Data = T>>) -> Self {
        Self(Some(model))
    }
}

impl<T> Model for ModelRc<T> {
    type Data = T;

    fn row_count(&self) -> usize {
        self.0.as_ref().map_or(0, |model| model.row_count())
    }

    fn row_data(&self, row: usize) -> Option<Self::Data> {
        self.0.as_ref().and_then(|model| model.row_data(row))
    }

    fn set_row_data(&self, row: usize, data: Self::Data) {
        if let Some(model) = self.0.as_ref() {
            model.set_row_data(row, data);
        }
    }

    fn model_tracker(&self) -> &dyn ModelTracker {
        self.0.as_ref().map_or(&() as &dyn ModelTracker, |model| model.model_tracker())
    }

    fn as_any(&self) -> &dyn Any {
        self.0.as_ref().map_or(&() as &dyn Any, |model| model.as_any())
    }
}

// =============================================================================
// TESTS
// =============================================================================
