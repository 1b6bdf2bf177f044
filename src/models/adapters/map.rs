// ============================================================================
// spark-properties - MapModel
// Presents each upstream row through a mapping function
// ============================================================================

use std::any::Any;

use crate::models::{Model, ModelRc, ModelTracker};

/// A model whose rows are the upstream rows passed through a function.
///
/// Rows correspond one to one, so the upstream notifications apply unchanged
/// and [`model_tracker`](Model::model_tracker) is the upstream tracker.
/// Writes through `set_row_data` are ignored.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use spark_properties::{Model, ModelExt, VecModel};
///
/// let names = Rc::new(VecModel::from(vec!["ada", "alan"]));
/// let upper = names.clone().map(|name| name.to_uppercase());
/// assert_eq!(upper.row_data(1), Some("ALAN".to_string()));
///
/// names.push("grace");
/// assert_eq!(upper.row_count(), 3);
/// ```
pub struct MapModel<T, U> {
    wrapped_model: ModelRc<T>,
    map_function: Box<dyn Fn(T) -> U>,
}

impl<T: 'static, U: 'static> MapModel<T, U> {
    /// Present `wrapped_model` through `map_function`
    pub fn new<M, F>(wrapped_model: M, map_function: F) -> Self
    where
        M: Model<Data = T> + 'static,
        F: Fn(T) -> U + 'static,
    {
        Self { wrapped_model: ModelRc::new(wrapped_model), map_function: Box::new(map_function) }
    }

    /// The model being mapped
    pub fn source_model(&self) -> &ModelRc<T> {
        &self.wrapped_model
    }
}

impl<T: 'static, U: 'static> Model for MapModel<T, U> {
    type Data = U;

    fn row_count(&self) -> usize {
        self.wrapped_model.row_count()
    }

    fn row_data(&self, row: usize) -> Option<Self::Data> {
        self.wrapped_model.row_data(row).map(|data| (self.map_function)(data))
    }

    fn model_tracker(&self) -> &dyn ModelTracker {
        self.wrapped_model.model_tracker()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::adapters::testing::{rows, Recorder};
    use crate::models::{ModelExt, VecModel};
    use std::rc::Rc;

    #[test]
    fn maps_rows_and_forwards_events() {
        let source = Rc::new(VecModel::from(vec![1, 2, 3]));
        let doubled = source.clone().map(|x| x * 2);
        let recorder = Recorder::attach_to(&doubled);

        assert_eq!(rows(&doubled), vec![2, 4, 6]);

        source.push(4);
        source.set_row_data(0, 10);
        source.remove(1);

        assert_eq!(recorder.take(), vec!["added 3 1", "changed 0", "removed 1 1"]);
        assert_eq!(rows(&doubled), vec![20, 6, 8]);
    }

    #[test]
    fn writes_are_ignored() {
        let source = Rc::new(VecModel::from(vec![1]));
        let mapped = MapModel::new(source.clone(), |x: i32| x + 1);

        mapped.set_row_data(0, 100);

        assert_eq!(source.row_data(0), Some(1));
        assert_eq!(mapped.row_data(0), Some(2));
        assert_eq!(mapped.row_data(1), None);
    }

    #[test]
    fn source_model_is_reachable() {
        let source = Rc::new(VecModel::from(vec![1, 2]));
        let mapped = MapModel::new(source, |x: i32| x.to_string());
        assert_eq!(mapped.source_model().row_count(), 2);
        assert!(mapped.as_any().downcast_ref::<MapModel<i32, String>>().is_some());
    }
}
