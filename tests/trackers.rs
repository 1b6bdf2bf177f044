use spark_properties::{evaluation_depth, is_tracking, AnySource, Property, PropertyTracker};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn test_nested_tracker_dirties_outer() {
    let p = Property::new(1);
    let outer = PropertyTracker::new();
    let inner = PropertyTracker::new();

    let value = outer.evaluate(|| inner.evaluate(|| p.get()));
    assert_eq!(value, 1);

    p.set(2);
    assert!(inner.is_dirty());
    assert!(outer.is_dirty());
}

#[test]
fn test_dependency_root_isolates_outer() {
    let p = Property::new(1);
    let outer = PropertyTracker::new();
    let inner = PropertyTracker::new();

    outer.evaluate(|| inner.evaluate_as_dependency_root(|| p.get()));

    p.set(2);
    assert!(inner.is_dirty());
    assert!(!outer.is_dirty());
}

#[test]
fn test_outer_reads_are_still_captured_around_root() {
    let a = Property::new(1);
    let b = Property::new(1);
    let outer = PropertyTracker::new();
    let inner = PropertyTracker::new();

    outer.evaluate(|| {
        a.get();
        inner.evaluate_as_dependency_root(|| b.get());
    });

    b.set(2);
    assert!(!outer.is_dirty());

    a.set(2);
    assert!(outer.is_dirty());
}

#[test]
fn test_evaluate_if_dirty_registers_even_when_clean() {
    let p = Property::new(1);
    let outer = PropertyTracker::new();
    let inner = PropertyTracker::new();
    inner.evaluate(|| p.get());

    let skipped = outer.evaluate(|| inner.evaluate_if_dirty(|| p.get()));
    assert_eq!(skipped, None);

    p.set(2);
    assert!(outer.is_dirty(), "clean inner tracker still became a dependency");
}

#[test]
fn test_write_always_dirties() {
    let p = Property::new(5);
    let tracker = PropertyTracker::new();
    tracker.evaluate(|| p.get());

    p.set(5);
    assert!(tracker.is_dirty());
}

#[test]
fn test_tracker_sees_binding_changes() {
    let source = Property::new(1);
    let bound = Property::new(0);
    let s = source.clone();
    bound.set_binding(move || s.get() + 1);

    let tracker = PropertyTracker::new();
    assert_eq!(tracker.evaluate(|| bound.get()), 2);

    source.set(10);
    assert!(tracker.is_dirty());
    assert_eq!(tracker.evaluate(|| bound.get()), 11);
    assert!(!tracker.is_dirty());
}

#[test]
fn test_dirty_handler_schedules_work() {
    let queue: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let q = queue.clone();
    let tracker = PropertyTracker::new_with_dirty_handler(move || q.borrow_mut().push("repaint"));
    let color = Property::new("red");

    tracker.evaluate(|| color.get());
    color.set("green");
    color.set("blue");
    assert_eq!(*queue.borrow(), vec!["repaint"]);

    tracker.evaluate_if_dirty(|| color.get());
    color.set("red");
    assert_eq!(*queue.borrow(), vec!["repaint", "repaint"]);
}

#[test]
fn test_dirty_handler_may_read_properties() {
    let p = Property::new(1);
    let seen = Rc::new(Cell::new(0));
    let (reader, s) = (p.clone(), seen.clone());
    let tracker = PropertyTracker::new_with_dirty_handler(move || s.set(reader.get_untracked()));

    tracker.evaluate(|| p.get());
    p.set(42);

    assert_eq!(seen.get(), 42);
}

#[test]
fn test_set_dirty_propagates_to_outer() {
    let outer = PropertyTracker::new();
    let inner = PropertyTracker::new();
    outer.evaluate(|| inner.evaluate(|| ()));
    assert!(!outer.is_dirty());

    inner.set_dirty();
    assert!(outer.is_dirty());
}

#[test]
fn test_tracking_state_inside_evaluate() {
    let tracker = PropertyTracker::new();
    assert!(!is_tracking());

    let (tracking, depth) = tracker.evaluate(|| (is_tracking(), evaluation_depth()));
    assert!(tracking);
    assert_eq!(depth, 1);
    assert_eq!(evaluation_depth(), 0);
}

#[test]
fn test_dropped_tracker_is_skipped() {
    let p = Property::new(1);
    {
        let tracker = PropertyTracker::new();
        tracker.evaluate(|| p.get());
        assert_eq!(p.inner().dependent_count(), 1);
    }
    assert_eq!(p.inner().dependent_count(), 0);
    p.set(2);
}
