// ============================================================================
// spark-properties - Dependency-Tracked Properties and Observable Models
// ============================================================================
//
// Properties hold values or lazily evaluated bindings and record who reads
// them. Trackers observe arbitrary closures. Models are observable lists whose
// changes reach listeners and bindings alike; filter, map, and sort adapters
// derive new models that stay in sync with their source.
// ============================================================================

//! Dependency-tracked properties, property trackers, and observable list
//! models with filter, map, and sort adapters.
//!
//! ```
//! use std::rc::Rc;
//! use spark_properties::{Model, ModelExt, Property, VecModel};
//!
//! let items = Rc::new(VecModel::from(vec![3, 1, 2]));
//! let sorted = Rc::new(items.clone().sort());
//!
//! let first = Property::new(0);
//! let s = sorted.clone();
//! first.set_binding(move || s.row_data_tracked(0).unwrap_or_default());
//! assert_eq!(first.get(), 1);
//!
//! items.push(0);
//! assert_eq!(first.get(), 0);
//! ```

pub mod core;
pub mod macros;
pub mod models;
pub mod primitives;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use core::constants;
pub use core::context::{evaluation_depth, is_tracking, is_untracking, with_context, ReactiveContext};
pub use core::types::{AnyDependent, AnySource};

// Re-export primitives at crate root
pub use primitives::property::Property;
pub use primitives::tracker::PropertyTracker;

// Re-export reactivity functions
pub use reactivity::untrack::untrack;

// Re-export models
pub use models::{
    FilterModel, MapModel, Model, ModelChangeListener, ModelError, ModelExt, ModelIterator,
    ModelNotify, ModelPeer, ModelRc, ModelTracker, SortModel, VecModel,
};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn flags_defined() {
        assert_eq!(constants::PROPERTY, 1 << 0);
        assert_eq!(constants::TRACKER, 1 << 1);
        assert_eq!(constants::CLEAN & constants::DIRTY, 0);
    }

    #[test]
    fn heterogeneous_sources() {
        let sources: Vec<Rc<dyn AnySource>> = vec![
            Property::new(1).as_any_source(),
            Property::new(String::from("hello")).as_any_source(),
            Property::new(vec![1, 2, 3]).as_any_source(),
        ];

        for source in &sources {
            assert_ne!(source.flags() & constants::PROPERTY, 0);
            assert!(!source.is_dirty());
        }
    }

    #[test]
    fn binding_over_model_row_count() {
        let model = Rc::new(VecModel::from(vec![1, 2]));
        let count = Property::new(0);
        let m = model.clone();
        count.set_binding(move || {
            m.model_tracker().track_row_count_changes();
            m.row_count()
        });
        assert_eq!(count.get(), 2);

        model.set_row_data(0, 5);
        assert!(!count.is_dirty());

        model.push(3);
        assert!(count.is_dirty());
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn binding_over_single_row() {
        let model = Rc::new(VecModel::from(vec![10, 20]));
        let second = Property::new(0);
        let m = model.clone();
        second.set_binding(move || m.row_data_tracked(1).unwrap_or_default());
        assert_eq!(second.get(), 20);

        model.set_row_data(0, 11);
        assert!(!second.is_dirty());

        model.set_row_data(1, 21);
        assert_eq!(second.get(), 21);
    }
}
