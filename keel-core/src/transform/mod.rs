//! Transforms
//!
//! Frame-driven animation of node properties.
//!
//! # Concepts
//!
//! ## Transforms
//!
//! A [`Transform`] is a resumable unit of work. The runner calls
//! [`Transform::run_frame`] once per tick with the time elapsed since the
//! transform started, and the transform answers with a [`Frame`]: keep going,
//! done, or replace me with this continuation. [`Transform::finish`] jumps
//! straight to the end state.
//!
//! The primitives are [`Func`] (run a closure once), [`Delay`] (wait),
//! [`Tween`] (interpolate one property), [`TextTween`] (typewriter text) and
//! [`WaitFor`] (wait for another runner).
//!
//! ## Composition
//!
//! A [`TransformBuilder`] collects transforms into parallel groups separated
//! by `then()`. Building it yields a [`TransformSequence`] of
//! [`ParallelTransformSequence`]s:
//!
//! ```text
//! create().move_to(a).fade_in(a).then().wait(0.5).then().hide(a)
//!
//! Sequence[ Parallel[move, fade], Parallel[delay], Parallel[hide] ]
//! ```
//!
//! ## Running
//!
//! A [`TransformRunner`] drives one transform from the host's
//! [`Heartbeat`](crate::host::Heartbeat). The [`TransformService`] keeps at
//! most one runner per key, finishing (or cancelling) the previous one when a
//! new transform is started for the same key.

mod builder;
mod easing;
mod primitives;
mod property;
mod runner;
mod sequence;
mod service;
pub mod transforms;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use builder::TransformBuilder;
pub use easing::{ease, ease_number, EasingDirection, EasingStyle};
pub use primitives::{Delay, Func, TextTween, Tween, TweenTarget, WaitFor};
pub use property::{
    node_key, props, Color3, Dim, Dim2, Node, NodeRef, PropertyBag, PropertyValue, Vector2,
};
pub use runner::{RunnerState, TransformRunner};
pub use sequence::{ParallelTransformSequence, TransformSequence};
pub use service::TransformService;

/// Outcome of one frame of a transform.
pub enum Frame {
    /// Not done yet; call again next tick.
    Continue,
    /// Completed.
    Done,
    /// Completed, and the given continuation takes over from this tick on.
    Replace(TransformBuilder),
}

/// A resumable, frame-driven unit of work.
pub trait Transform {
    /// Advance to `time` seconds since this transform started.
    fn run_frame(&mut self, time: f64) -> Frame;

    /// Jump to the end state.
    fn finish(&mut self);
}

impl Transform for Box<dyn Transform> {
    fn run_frame(&mut self, time: f64) -> Frame {
        (**self).run_frame(time)
    }

    fn finish(&mut self) {
        (**self).finish()
    }
}

/// Anything that can be turned into a boxed transform.
pub trait IntoTransform {
    fn into_transform(self) -> Box<dyn Transform>;
}

impl<T: Transform + 'static> IntoTransform for T {
    fn into_transform(self) -> Box<dyn Transform> {
        Box::new(self)
    }
}

impl IntoTransform for TransformBuilder {
    fn into_transform(self) -> Box<dyn Transform> {
        Box::new(self.build_sequence())
    }
}

/// Timing of a tween.
///
/// Missing fields deserialize to their defaults: zero duration, `Quad`,
/// `Out`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformProps {
    /// Seconds.
    pub duration: f64,
    pub style: EasingStyle,
    pub direction: EasingDirection,
}

impl TransformProps {
    /// 0.2 s, `Quad`, `Out`.
    pub const QUAD_OUT_02: Self = Self {
        duration: 0.2,
        style: EasingStyle::Quad,
        direction: EasingDirection::Out,
    };

    pub const fn new(duration: f64, style: EasingStyle, direction: EasingDirection) -> Self {
        Self {
            duration,
            style,
            direction,
        }
    }

    /// Same easing, different duration.
    pub const fn with_duration(self, duration: f64) -> Self {
        Self { duration, ..self }
    }

    /// Parse a preset from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for TransformProps {
    fn default() -> Self {
        Self {
            duration: 0.0,
            style: EasingStyle::Quad,
            direction: EasingDirection::Out,
        }
    }
}
