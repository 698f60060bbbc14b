//! Drives one transform from the heartbeat.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::{Frame, IntoTransform, Transform};
use crate::component::{AsComponent, Component, WeakComponent};
use crate::host::Heartbeat;

/// Where a runner is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunnerState {
    /// Created, not yet enabled.
    Pending,
    Running,
    /// Reached its end, naturally or through [`TransformRunner::finish`].
    Completed,
    Cancelled,
}

impl RunnerState {
    pub fn is_done(self) -> bool {
        matches!(self, RunnerState::Completed | RunnerState::Cancelled)
    }
}

struct RunnerInner {
    transform: RefCell<Option<Box<dyn Transform>>>,
    time: Cell<f64>,
    first_ran: Cell<bool>,
    finish_requested: Cell<bool>,
    state: Cell<RunnerState>,
}

/// A component that advances one transform per heartbeat tick.
///
/// The first frame runs synchronously when the runner is first enabled, at
/// time zero. Every tick after that adds `dt` to the runner's clock and runs
/// a frame. Continuations returned by the transform take over in the same
/// tick. The runner destroys itself once the transform completes.
///
/// Disabling the runner pauses it; [`finish`](Self::finish) and
/// [`cancel`](Self::cancel) end it for good.
#[derive(Clone)]
pub struct TransformRunner {
    component: Component,
    inner: Rc<RunnerInner>,
}

impl TransformRunner {
    /// Create a disabled runner for `transform`, ticking on `heartbeat`.
    pub fn new(transform: impl IntoTransform, heartbeat: &Heartbeat) -> Self {
        let runner = Self {
            component: Component::new(),
            inner: Rc::new(RunnerInner {
                transform: RefCell::new(Some(transform.into_transform())),
                time: Cell::new(0.0),
                first_ran: Cell::new(false),
                finish_requested: Cell::new(false),
                state: Cell::new(RunnerState::Pending),
            }),
        };

        let weak = runner.downgrade();
        runner
            .component
            .event()
            .subscribe(heartbeat.signal(), move |dt: &f64| {
                if let Some(runner) = weak.upgrade() {
                    runner.inner.time.set(runner.inner.time.get() + dt);
                    runner.step();
                }
            });

        let weak = runner.downgrade();
        runner.component.on_enable(move || {
            let Some(runner) = weak.upgrade() else {
                return;
            };
            if !runner.inner.first_ran.replace(true) {
                runner.step();
            }
        });

        let weak = runner.downgrade();
        runner.component.on_destroy(move || {
            let Some(runner) = weak.upgrade() else {
                return;
            };
            if !runner.is_done() {
                runner.inner.state.set(RunnerState::Cancelled);
            }
            if let Ok(mut transform) = runner.inner.transform.try_borrow_mut() {
                transform.take();
            };
        });

        runner
    }

    pub fn state(&self) -> RunnerState {
        self.inner.state.get()
    }

    /// Whether the runner completed or was cancelled.
    pub fn is_done(&self) -> bool {
        self.state().is_done()
    }

    /// Seconds of heartbeat time this runner has seen.
    pub fn time(&self) -> f64 {
        self.inner.time.get()
    }

    /// Jump the transform to its end state and stop.
    ///
    /// Called from inside the transform's own frame, the finish is deferred
    /// until that frame returns.
    pub fn finish(&self) {
        if self.is_done() {
            return;
        }

        let Ok(mut slot) = self.inner.transform.try_borrow_mut() else {
            self.inner.finish_requested.set(true);
            return;
        };
        let transform = slot.take();
        drop(slot);

        self.inner.state.set(RunnerState::Completed);
        trace!(runner = %self.id(), "transform finished");
        if let Some(mut transform) = transform {
            transform.finish();
        }
        self.component.destroy();
    }

    /// Stop where it is, leaving properties at their current values.
    pub fn cancel(&self) {
        if self.is_done() {
            return;
        }

        self.inner.state.set(RunnerState::Cancelled);
        trace!(runner = %self.id(), "transform cancelled");
        self.component.destroy();
    }

    fn step(&self) {
        if self.is_done() {
            return;
        }

        let Ok(mut slot) = self.inner.transform.try_borrow_mut() else {
            return;
        };
        let Some(transform) = slot.as_mut() else {
            return;
        };

        self.inner.state.set(RunnerState::Running);
        let time = self.inner.time.get();
        let mut frame = transform.run_frame(time);
        while let Frame::Replace(continuation) = frame {
            let mut next: Box<dyn Transform> =
                Box::new(continuation.build_sequence().starting_at(time));
            frame = next.run_frame(time);
            *transform = next;
        }
        drop(slot);

        if self.inner.finish_requested.get() {
            self.finish();
        } else if self.is_done() {
            self.inner.transform.borrow_mut().take();
        } else if matches!(frame, Frame::Done) {
            self.inner.state.set(RunnerState::Completed);
            self.inner.transform.borrow_mut().take();
            trace!(runner = %self.id(), "transform completed");
            self.component.destroy();
        }
    }

    fn downgrade(&self) -> WeakRunner {
        WeakRunner {
            component: self.component.downgrade(),
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl AsComponent for TransformRunner {
    fn component(&self) -> &Component {
        &self.component
    }
}

impl fmt::Debug for TransformRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRunner")
            .field("id", &self.component.id())
            .field("state", &self.state())
            .field("time", &self.time())
            .finish()
    }
}

struct WeakRunner {
    component: WeakComponent,
    inner: Weak<RunnerInner>,
}

impl WeakRunner {
    fn upgrade(&self) -> Option<TransformRunner> {
        Some(TransformRunner {
            component: self.component.upgrade()?,
            inner: self.inner.upgrade()?,
        })
    }
}
