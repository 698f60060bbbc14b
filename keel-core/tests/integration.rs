//! Integration Tests for the Component Runtime
//!
//! These tests verify that components, overlay storage and the transform
//! engine work together correctly through the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use keel_core::component::{AsComponent, Component, ComponentChildren, OverlayValueStorage};
use keel_core::event::{ObservableSwitch, ReadonlyObservable};
use keel_core::host::Heartbeat;
use keel_core::key::Key;
use keel_core::transform::{
    transforms, Delay, EasingDirection, EasingStyle, Frame, Func, IntoTransform, Node,
    ParallelTransformSequence, PropertyValue, RunnerState, Transform, TransformProps,
    TransformService,
};

type Log = Rc<RefCell<Vec<String>>>;

fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
    let count = Rc::new(Cell::new(0));
    let inner = count.clone();
    (count, move || inner.set(inner.get() + 1))
}

/// Records frames and finishes, completing after `frames` frames.
struct Recorder {
    name: &'static str,
    frames: u32,
    log: Log,
}

impl Transform for Recorder {
    fn run_frame(&mut self, time: f64) -> Frame {
        self.log.borrow_mut().push(format!("{} frame {time}", self.name));
        self.frames = self.frames.saturating_sub(1);
        if self.frames == 0 {
            Frame::Done
        } else {
            Frame::Continue
        }
    }

    fn finish(&mut self) {
        self.log.borrow_mut().push(format!("{} finish", self.name));
    }
}

fn recorder(name: &'static str, frames: u32, log: &Log) -> Recorder {
    Recorder {
        name,
        frames,
        log: log.clone(),
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Test the enable/disable/destroy scenario on a parent with one child.
#[test]
fn parent_child_lifecycle_scenario() {
    let a = Component::new();
    let b = a.parent(Component::new());
    let (destroyed, on_destroy) = counter();
    a.on_destroy(on_destroy);

    a.enable();
    assert!(b.is_enabled());

    a.disable();
    assert!(!b.is_enabled());

    a.destroy();
    assert!(a.is_destroyed());
    assert!(b.is_destroyed());

    a.destroy();
    assert_eq!(destroyed.get(), 1);
}

/// Test that repeated transitions fire their callbacks once.
#[test]
fn lifecycle_transitions_are_idempotent() {
    let component = Component::new();
    let (enabled, on_enable) = counter();
    let (disabled, on_disable) = counter();
    component.on_enable(on_enable);
    component.on_disable(on_disable);

    component.enable();
    component.enable();
    component.disable();
    component.disable();

    assert_eq!(enabled.get(), 1);
    assert_eq!(disabled.get(), 1);

    component.destroy();
    component.enable();
    assert!(!component.is_enabled());
}

/// Test that propagation reaches grandchildren through containers.
#[test]
fn propagation_reaches_nested_children() {
    let root = Component::new();
    let list: ComponentChildren<Component> = root.parent(ComponentChildren::new(false));
    let item = list.add(Component::new());

    root.enable();
    assert!(list.is_enabled());
    assert!(item.is_enabled());

    root.destroy();
    assert!(item.is_destroyed());
}

/// Test that a switch-driven container only enables its child by vote.
#[test]
fn state_container_gates_child() {
    let screen = Component::new();
    let child = Component::new();
    let enabled: ObservableSwitch =
        keel_core::component::ComponentStateContainer::create(&screen, child.clone());

    enabled.set("modal", false);
    screen.enable();
    assert!(!child.is_enabled());

    enabled.remove("modal");
    assert!(child.is_enabled());
}

// ---------------------------------------------------------------------------
// Overlay storage
// ---------------------------------------------------------------------------

/// Test that the fold follows explicit order, not registration order.
#[test]
fn overlay_fold_is_ordered_by_index() {
    let storage: OverlayValueStorage<String> = OverlayValueStorage::new(String::new());
    storage.effect(Key::from("b").at(2), |value| value + "b");
    storage.effect(Key::from("a").at(1), |value| value + "a");
    storage.effect(Key::from("c").at(3), |value| value + "c");

    assert_eq!(storage.get(), "abc");
}

/// Test the `and` fold over indexed slots.
#[test]
fn overlay_and_fold() {
    let storage = OverlayValueStorage::new(true);
    storage.and(Key::from("b").at(2), Some(true));
    storage.and(Key::from("a").at(1), Some(true));
    storage.and(Key::from("c").at(3), Some(false));
    assert!(!storage.get());

    storage.and(Key::from("c"), Some(true));
    assert!(storage.get());
}

/// Test that `changed` only fires when the effective value moves.
#[test]
fn overlay_changes_are_equality_gated() {
    let storage = OverlayValueStorage::new(false);
    let (fired, on_change) = counter();
    storage.subscribe(move |_, _| on_change());

    storage.or("hover", Some(true));
    storage.or("focus", Some(true));
    storage.or("hover", Some(false));
    assert_eq!(fired.get(), 1);

    storage.or("focus", None);
    assert_eq!(fired.get(), 2);
    assert!(!storage.get());
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

fn linear(duration: f64) -> TransformProps {
    TransformProps::new(duration, EasingStyle::Linear, EasingDirection::In)
}

/// Test that a tween lands exactly on its target at its duration.
#[test]
fn tween_reaches_exact_end_value() {
    let heartbeat = Heartbeat::new();
    let service = TransformService::new(heartbeat.clone());
    let node = Node::new().with_property("Value", 0.0).into_ref();

    transforms::create()
        .transform(&node, "Value", 10.0, TransformProps::new(1.0, EasingStyle::Sine, EasingDirection::InOut))
        .run(&service, "value", false);

    for _ in 0..4 {
        heartbeat.tick(0.25);
    }
    assert_eq!(node.get("Value").unwrap(), PropertyValue::Number(10.0));
}

/// Test that finishing a tween early also lands exactly on its target.
#[test]
fn finished_tween_reaches_exact_end_value() {
    let heartbeat = Heartbeat::new();
    let service = TransformService::new(heartbeat.clone());
    let node = Node::new().with_property("Value", 0.0).into_ref();

    let runner = transforms::create()
        .transform(&node, "Value", 10.0, linear(1.0))
        .run(&service, "value", false);
    heartbeat.tick(0.37);

    runner.finish();
    assert_eq!(node.get("Value").unwrap(), PropertyValue::Number(10.0));
}

/// Test that a step never starts before the previous one completes.
#[test]
fn sequence_steps_do_not_overlap() {
    let log = Log::default();
    let mut sequence = transforms::create()
        .push(recorder("a", 2, &log))
        .then()
        .push(recorder("b", 1, &log))
        .build_sequence();

    let mut time = 0.0;
    while matches!(sequence.run_frame(time), Frame::Continue) {
        time += 0.5;
    }

    assert_eq!(
        *log.borrow(),
        vec!["a frame 0", "a frame 0.5", "b frame 0.5"]
    );
}

/// Test that replacing a running transform finishes it before the new one
/// starts.
#[test]
fn replacing_finishes_first() {
    let log = Log::default();
    let service = TransformService::new(Heartbeat::new());

    let first = service.run("key", recorder("first", 10, &log), false);
    service.run("key", recorder("second", 10, &log), false);

    assert_eq!(first.state(), RunnerState::Completed);
    assert_eq!(
        *log.borrow(),
        vec!["first frame 0", "first finish", "second frame 0"]
    );
}

/// Test that a continuation in a parallel group sees the group's clock.
#[test]
fn parallel_continuation_shares_the_group_clock() {
    let log = Log::default();
    let late = recorder("late", 1, &log);
    let mut group = ParallelTransformSequence::new([
        Delay::new(10.0).into_transform(),
        Func::dynamic(move || Some(transforms::create().push(late))).into_transform(),
    ]);

    assert!(matches!(group.run_frame(1.0), Frame::Continue));
    assert_eq!(group.len(), 1);
    assert_eq!(*log.borrow(), vec!["late frame 1"]);
}

/// Test that a transform replacing its own key from one of its steps is
/// finished before the replacement takes its first frame.
#[test]
fn replacing_own_key_from_a_step_finishes_first() {
    let heartbeat = Heartbeat::new();
    let service = TransformService::new(heartbeat.clone());
    let node = Node::new().with_property("Value", 0.0).into_ref();

    let replacer = service.clone();
    let target = node.clone();
    let first = transforms::create()
        .func(move || {
            replacer.run(
                "value",
                transforms::create().transform(&target, "Value", 5.0, linear(1.0)),
                false,
            );
        })
        .then()
        .transform(&node, "Value", 100.0, linear(1.0))
        .run(&service, "value", false);

    assert_eq!(first.state(), RunnerState::Completed);
    assert_eq!(service.running_count(), 1);
    assert_eq!(node.get("Value").unwrap(), PropertyValue::Number(100.0));

    heartbeat.tick(0.5);
    assert_eq!(node.get("Value").unwrap(), PropertyValue::Number(52.5));

    heartbeat.tick(0.5);
    assert_eq!(node.get("Value").unwrap(), PropertyValue::Number(5.0));
    assert_eq!(service.running_count(), 0);
}

/// Test that replacing with `cancel_existing` never finishes the old one.
#[test]
fn replacing_with_cancel_skips_finish() {
    let log = Log::default();
    let service = TransformService::new(Heartbeat::new());

    let first = service.run("key", recorder("first", 10, &log), false);
    service.run("key", recorder("second", 10, &log), true);

    assert_eq!(first.state(), RunnerState::Cancelled);
    assert!(first.is_destroyed());
    assert_eq!(*log.borrow(), vec!["first frame 0", "second frame 0"]);
}

/// Test that a transform can finish its own runner mid-frame.
#[test]
fn runner_finished_from_its_own_frame() {
    let service = TransformService::new(Heartbeat::new());
    let node = Node::gui().into_ref();
    let finisher = service.clone();

    let runner = transforms::create()
        .func(move || finisher.finish("self"))
        .then()
        .fade_out(&node, linear(5.0))
        .run(&service, "self", false);

    assert_eq!(runner.state(), RunnerState::Completed);
    assert!(service.get_running("self").is_none());
    assert_eq!(
        node.get(keel_core::transform::props::TRANSPARENCY).unwrap(),
        PropertyValue::Number(1.0)
    );
}

/// Test that a builder can wait for the transforms of a component's
/// children.
#[test]
fn waits_for_children_transforms() {
    let heartbeat = Heartbeat::new();
    let service = TransformService::new(heartbeat.clone());
    let parent = Component::new();
    let child = parent.parent(Component::new());
    let node = Node::gui().into_ref();

    service.run(&child, transforms::create().wait(1.0), false);
    let after = transforms::create()
        .wait_for_transform_of_children(&service, &parent)
        .then()
        .hide(&node)
        .run(&service, "after", false);

    heartbeat.tick(0.5);
    assert!(!after.is_done());

    for _ in 0..4 {
        heartbeat.tick(0.5);
    }
    assert!(after.is_done());
    assert_eq!(
        node.get(keel_core::transform::props::VISIBLE).unwrap(),
        PropertyValue::Bool(false)
    );
}
