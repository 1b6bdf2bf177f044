// ============================================================================
// spark-properties - Model Adapters
// Derived models that present another model mapped, filtered, or sorted
// ============================================================================
//
// Filter and sort adapters keep an index mapping (their row -> upstream row)
// and listen to the upstream model through a ModelPeer. Every upstream change
// is translated into the minimal change of the adapter's own rows and
// re-broadcast from the adapter's ModelNotify. The map adapter has no state:
// its rows correspond one to one, so it hands out the upstream tracker.
// ============================================================================

pub mod filter;
pub mod map;
pub mod sort;

pub use filter::FilterModel;
pub use map::MapModel;
pub use sort::SortModel;

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::models::{Model, ModelChangeListener, ModelPeer};

    /// Records notifications as compact strings
    #[derive(Default)]
    pub struct Recorder {
        pub events: RefCell<Vec<String>>,
    }

    impl Recorder {
        pub fn attach_to<T>(model: &dyn Model<Data = T>) -> Rc<Self> {
            let recorder = Rc::new(Self::default());
            model.model_tracker().attach_peer(ModelPeer::new(&recorder));
            recorder
        }

        pub fn take(&self) -> Vec<String> {
            self.events.take()
        }
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

    pub fn rows(model: &dyn Model<Data = i32>) -> Vec<i32> {
        (0..model.row_count()).filter_map(|row| model.row_data(row)).collect()
    }
}
