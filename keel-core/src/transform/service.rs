//! Keyed registry of running transforms.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::builder::TransformBuilder;
use super::runner::TransformRunner;
use super::IntoTransform;
use crate::component::AsComponent;
use crate::host::Heartbeat;
use crate::key::Key;

struct ServiceInner {
    heartbeat: Heartbeat,
    running: RefCell<HashMap<Key, TransformRunner>>,
}

/// At most one running transform per key.
///
/// Starting a transform under a key that already has one ends the old one
/// first: finished (jumped to its end state) by default, or cancelled (left
/// where it is) on request. Runners leave the registry when they are
/// destroyed, however that happens.
///
/// The service is an explicit value rather than a global; clones share the
/// same registry.
#[derive(Clone)]
pub struct TransformService {
    inner: Rc<ServiceInner>,
}

impl TransformService {
    pub fn new(heartbeat: Heartbeat) -> Self {
        Self {
            inner: Rc::new(ServiceInner {
                heartbeat,
                running: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// The heartbeat new runners tick on.
    pub fn heartbeat(&self) -> &Heartbeat {
        &self.inner.heartbeat
    }

    /// Start `transform` under `key`, ending whatever ran there before.
    ///
    /// The new runner takes its first frame before this returns, unless the
    /// call comes from inside a frame of the runner it replaces. That runner
    /// can only finish once its frame has returned, so the new one is
    /// registered at once but starts right after the old one has finished.
    pub fn run(
        &self,
        key: impl Into<Key>,
        transform: impl IntoTransform,
        cancel_existing: bool,
    ) -> TransformRunner {
        let key = key.into();
        let transform = transform.into_transform();

        let existing = self.inner.running.borrow().get(&key).cloned();
        let mut unwinding = None;
        if let Some(existing) = existing {
            debug!(%key, cancel_existing, "replacing running transform");
            if cancel_existing {
                existing.cancel();
            } else {
                existing.finish();
            }
            // Still inside its own frame; the finish lands when it returns.
            if !existing.is_done() {
                unwinding = Some(existing);
            }
        }

        let runner = TransformRunner::new(transform, &self.inner.heartbeat);
        self.inner
            .running
            .borrow_mut()
            .insert(key.clone(), runner.clone());

        let registry: Weak<ServiceInner> = Rc::downgrade(&self.inner);
        let id = runner.id();
        runner.on_destroy(move || {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            let mut running = registry.running.borrow_mut();
            if running.get(&key).is_some_and(|current| current.id() == id) {
                let removed = running.remove(&key);
                drop(running);
                drop(removed);
            }
        });

        match unwinding {
            Some(existing) => {
                let pending = runner.component().downgrade();
                existing.on_destroy(move || {
                    if let Some(pending) = pending.upgrade() {
                        pending.enable();
                    }
                });
            }
            None => runner.enable(),
        }
        runner
    }

    /// Build a transform from a fresh builder and run it under `key`.
    pub fn run_with<F>(&self, key: impl Into<Key>, setup: F, cancel_existing: bool) -> TransformRunner
    where
        F: FnOnce(TransformBuilder) -> TransformBuilder,
    {
        self.run(key, setup(TransformBuilder::new()), cancel_existing)
    }

    /// Finish the transform running under `key`, if any.
    pub fn finish(&self, key: impl Into<Key>) {
        if let Some(runner) = self.get_running(key) {
            runner.finish();
        }
    }

    /// Cancel the transform running under `key`, if any.
    pub fn cancel(&self, key: impl Into<Key>) {
        if let Some(runner) = self.get_running(key) {
            runner.cancel();
        }
    }

    /// The runner currently registered under `key`.
    pub fn get_running(&self, key: impl Into<Key>) -> Option<TransformRunner> {
        self.inner.running.borrow().get(&key.into()).cloned()
    }

    /// Number of keys with a running transform.
    pub fn running_count(&self) -> usize {
        self.inner.running.borrow().len()
    }
}

impl fmt::Debug for TransformService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformService")
            .field("running", &self.running_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{
        node_key, props, transforms, EasingDirection, EasingStyle, Node, PropertyValue, RunnerState,
        TransformProps,
    };

    fn linear(duration: f64) -> TransformProps {
        TransformProps::new(duration, EasingStyle::Linear, EasingDirection::In)
    }

    fn service() -> TransformService {
        TransformService::new(Heartbeat::new())
    }

    #[test]
    fn runs_immediately_and_unregisters_when_done() {
        let service = service();
        let node = Node::gui().into_ref();

        let runner = service.run("fade", transforms::create().fade_out(&node, linear(1.0)), false);
        assert_eq!(runner.state(), RunnerState::Running);
        assert!(service.get_running("fade").is_some());

        service.heartbeat().tick(1.0);
        assert_eq!(runner.state(), RunnerState::Completed);
        assert!(service.get_running("fade").is_none());
    }

    #[test]
    fn instant_transform_never_stays_registered() {
        let service = service();
        let node = Node::gui().into_ref();

        service.run("hide", transforms::create().hide(&node), false);
        assert_eq!(service.running_count(), 0);
        assert_eq!(node.get(props::VISIBLE).unwrap(), PropertyValue::Bool(false));
    }

    #[test]
    fn replacing_finishes_the_old_transform_by_default() {
        let service = service();
        let node = Node::gui().into_ref();

        let first = service.run("key", transforms::create().fade_out(&node, linear(1.0)), false);
        service.heartbeat().tick(0.5);

        let second = service.run("key", transforms::create().wait(5.0), false);
        assert_eq!(first.state(), RunnerState::Completed);
        assert_eq!(node.get(props::TRANSPARENCY).unwrap(), PropertyValue::Number(1.0));
        assert!(service.get_running("key").is_some_and(|r| r.id() == second.id()));
    }

    #[test]
    fn replacing_from_inside_the_old_frame_finishes_it_first() {
        let service = service();
        let node = Node::new().with_property("Value", 0.0).into_ref();

        let replacer = service.clone();
        let target = node.clone();
        let first = transforms::create()
            .func(move || {
                replacer.run(
                    "key",
                    transforms::create().transform(&target, "Value", 5.0, linear(1.0)),
                    false,
                );
            })
            .then()
            .transform(&node, "Value", 100.0, linear(1.0))
            .run(&service, "key", false);

        assert_eq!(first.state(), RunnerState::Completed);
        assert_eq!(node.get("Value").unwrap(), PropertyValue::Number(100.0));
        assert_eq!(service.running_count(), 1);
        assert!(service.get_running("key").is_some_and(|r| r.id() != first.id()));

        service.heartbeat().tick(0.5);
        assert_eq!(node.get("Value").unwrap(), PropertyValue::Number(52.5));
    }

    #[test]
    fn replacing_can_cancel_instead() {
        let service = service();
        let node = Node::gui().into_ref();

        let first = service.run("key", transforms::create().fade_out(&node, linear(1.0)), false);
        service.heartbeat().tick(0.5);

        service.run("key", transforms::create().wait(5.0), true);
        assert_eq!(first.state(), RunnerState::Cancelled);
        assert_eq!(node.get(props::TRANSPARENCY).unwrap(), PropertyValue::Number(0.5));
    }

    #[test]
    fn finish_and_cancel_by_key() {
        let service = service();
        let node = Node::gui().into_ref();

        let fade = service.run("fade", transforms::create().fade_out(&node, linear(1.0)), false);
        let wait = service.run("wait", transforms::create().wait(1.0), false);

        service.finish("fade");
        service.cancel("wait");
        service.cancel("missing");

        assert_eq!(fade.state(), RunnerState::Completed);
        assert_eq!(wait.state(), RunnerState::Cancelled);
        assert_eq!(service.running_count(), 0);
    }

    #[test]
    fn run_with_builds_from_fresh_builder() {
        let service = service();
        let node = Node::gui().into_ref();

        service.run_with(node_key(&node), |builder| builder.hide(&node), false);
        assert_eq!(node.get(props::VISIBLE).unwrap(), PropertyValue::Bool(false));
    }

    #[test]
    fn wait_for_transform_of_follows_other_key() {
        let service = service();
        let node = Node::gui().into_ref();

        service.run("slow", transforms::create().wait(1.0), false);
        let follower = transforms::create()
            .wait_for_transform_of(&service, "slow")
            .then()
            .hide(&node)
            .run(&service, "follower", false);

        service.heartbeat().tick(0.5);
        assert_eq!(node.get(props::VISIBLE).unwrap(), PropertyValue::Bool(true));
        service.heartbeat().tick(0.5);

        for _ in 0..3 {
            service.heartbeat().tick(0.1);
        }
        assert_eq!(node.get(props::VISIBLE).unwrap(), PropertyValue::Bool(false));
        assert!(follower.is_done());
    }
}
