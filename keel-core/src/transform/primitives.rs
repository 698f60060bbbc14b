//! Primitive transforms.

use std::borrow::Cow;
use std::fmt;

use tracing::warn;

use super::easing::{ease, ease_number};
use super::property::{NodeRef, PropertyValue};
use super::runner::TransformRunner;
use super::{Frame, Transform, TransformBuilder, TransformProps};
use crate::error::PropertyError;

type FuncBody = Box<dyn FnOnce() -> Option<TransformBuilder>>;

/// Runs a closure exactly once.
///
/// If the closure returns a builder, that builder replaces this transform
/// and starts running in the same tick.
pub struct Func {
    func: Option<FuncBody>,
}

impl Func {
    /// Run `func` once.
    pub fn new<F>(func: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self::dynamic(move || {
            func();
            None
        })
    }

    /// Run `func` once and continue with whatever it returns.
    pub fn dynamic<F>(func: F) -> Self
    where
        F: FnOnce() -> Option<TransformBuilder> + 'static,
    {
        Self {
            func: Some(Box::new(func)),
        }
    }
}

impl Transform for Func {
    fn run_frame(&mut self, _time: f64) -> Frame {
        match self.func.take().and_then(|func| func()) {
            Some(continuation) => Frame::Replace(continuation),
            None => Frame::Done,
        }
    }

    fn finish(&mut self) {
        if let Some(continuation) = self.func.take().and_then(|func| func()) {
            continuation.build_sequence().finish();
        }
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("ran", &self.func.is_none())
            .finish()
    }
}

/// Completes once `delay` seconds have passed.
#[derive(Debug, Clone, Copy)]
pub struct Delay {
    delay: f64,
}

impl Delay {
    pub fn new(delay: f64) -> Self {
        Self { delay }
    }
}

impl Transform for Delay {
    fn run_frame(&mut self, time: f64) -> Frame {
        if time >= self.delay {
            Frame::Done
        } else {
            Frame::Continue
        }
    }

    fn finish(&mut self) {}
}

type LazyValue = Box<dyn Fn() -> Result<PropertyValue, PropertyError>>;

/// The value a tween ends at.
pub enum TweenTarget {
    /// Known when the tween is built.
    Fixed(PropertyValue),
    /// Computed on the tween's first frame, e.g. relative to the live value.
    Lazy(LazyValue),
}

impl TweenTarget {
    /// A target computed on first use.
    pub fn lazy<F>(func: F) -> Self
    where
        F: Fn() -> Result<PropertyValue, PropertyError> + 'static,
    {
        TweenTarget::Lazy(Box::new(func))
    }

    fn resolve(&self) -> Result<PropertyValue, PropertyError> {
        match self {
            TweenTarget::Fixed(value) => Ok(value.clone()),
            TweenTarget::Lazy(func) => func(),
        }
    }
}

impl fmt::Debug for TweenTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TweenTarget::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            TweenTarget::Lazy(_) => f.write_str("Lazy"),
        }
    }
}

/// State shared by [`Tween`] and [`TextTween`].
struct Tweening {
    node: NodeRef,
    property: Cow<'static, str>,
    target: TweenTarget,
    props: TransformProps,
    start: Option<PropertyValue>,
    actual: Option<PropertyValue>,
}

impl Tweening {
    fn new(
        node: NodeRef,
        property: Cow<'static, str>,
        target: TweenTarget,
        props: TransformProps,
    ) -> Self {
        Self {
            node,
            property,
            target,
            props,
            start: None,
            actual: None,
        }
    }

    /// Capture the start and target values on first use.
    fn capture(&mut self) -> Result<(PropertyValue, PropertyValue), PropertyError> {
        let start = match &self.start {
            Some(start) => start.clone(),
            None => {
                let start = self.node.get(&self.property)?;
                self.start = Some(start.clone());
                start
            }
        };
        let actual = match &self.actual {
            Some(actual) => actual.clone(),
            None => {
                let actual = self.target.resolve()?;
                self.actual = Some(actual.clone());
                actual
            }
        };

        Ok((start, actual))
    }

    fn alpha(&self, time: f64) -> f64 {
        ease(time / self.props.duration, self.props.style, self.props.direction)
    }

    fn write(&self, value: PropertyValue) {
        if let Err(error) = self.node.set(&self.property, value) {
            warn!(node = %self.node.id(), property = %self.property, %error, "tween write failed");
        }
    }

    /// Write the exact target value.
    fn finish(&mut self) {
        let actual = match self.actual.take() {
            Some(actual) => Ok(actual),
            None => self.target.resolve(),
        };

        match actual {
            Ok(actual) => self.write(actual),
            Err(error) => {
                warn!(node = %self.node.id(), property = %self.property, %error, "tween target unavailable");
            }
        }
    }

    fn abort(&mut self, error: PropertyError) -> Frame {
        warn!(node = %self.node.id(), property = %self.property, %error, "tween aborted");
        self.finish();
        Frame::Done
    }
}

/// Interpolates one property of a node to a target value.
///
/// The start value is read from the live property on the first frame, so a
/// tween queued behind others starts from wherever they left it. At or past
/// its duration the tween writes the target value exactly.
pub struct Tween {
    state: Tweening,
}

impl Tween {
    /// Tween to a value known up front.
    pub fn new(
        node: NodeRef,
        property: impl Into<Cow<'static, str>>,
        value: impl Into<PropertyValue>,
        props: TransformProps,
    ) -> Self {
        Self::with_target(node, property, TweenTarget::Fixed(value.into()), props)
    }

    pub fn with_target(
        node: NodeRef,
        property: impl Into<Cow<'static, str>>,
        target: TweenTarget,
        props: TransformProps,
    ) -> Self {
        Self {
            state: Tweening::new(node, property.into(), target, props),
        }
    }
}

impl Transform for Tween {
    fn run_frame(&mut self, time: f64) -> Frame {
        if time >= self.state.props.duration {
            self.state.finish();
            return Frame::Done;
        }

        let (start, actual) = match self.state.capture() {
            Ok(values) => values,
            Err(error) => return self.state.abort(error),
        };

        let alpha = self.state.alpha(time);
        match start.lerp(&actual, alpha) {
            Some(value) => {
                self.state.write(value);
                Frame::Continue
            }
            None => self.state.abort(PropertyError::TypeMismatch {
                property: self.state.property.to_string(),
                expected: start.kind(),
                found: actual.kind(),
            }),
        }
    }

    fn finish(&mut self) {
        self.state.finish();
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("node", &self.state.node.id())
            .field("property", &self.state.property)
            .field("target", &self.state.target)
            .field("props", &self.state.props)
            .finish()
    }
}

/// Typewriter animation of a text property.
///
/// Types the target text in character by character. When the target is
/// empty, erases the current text instead.
pub struct TextTween {
    state: Tweening,
}

impl TextTween {
    pub fn new(
        node: NodeRef,
        property: impl Into<Cow<'static, str>>,
        text: impl Into<String>,
        props: TransformProps,
    ) -> Self {
        Self {
            state: Tweening::new(
                node,
                property.into(),
                TweenTarget::Fixed(PropertyValue::Text(text.into())),
                props,
            ),
        }
    }
}

fn prefix(text: &str, chars: f64) -> String {
    let chars = chars.max(0.0).floor() as usize;
    text.chars().take(chars).collect()
}

impl Transform for TextTween {
    fn run_frame(&mut self, time: f64) -> Frame {
        if time >= self.state.props.duration {
            self.state.finish();
            return Frame::Done;
        }

        let (start, actual) = match self.state.capture() {
            Ok(values) => values,
            Err(error) => return self.state.abort(error),
        };
        let (Some(start), Some(actual)) = (start.as_text(), actual.as_text()) else {
            return self.state.abort(PropertyError::TypeMismatch {
                property: self.state.property.to_string(),
                expected: "Text",
                found: start.kind(),
            });
        };

        let progress = time / self.state.props.duration;
        let (style, direction) = (self.state.props.style, self.state.props.direction);
        let text = if actual.is_empty() {
            let len = start.chars().count() as f64;
            prefix(start, ease_number(progress, len, 0.0, style, direction))
        } else {
            let len = actual.chars().count() as f64;
            prefix(actual, ease_number(progress, 0.0, len, style, direction))
        };

        self.state.write(PropertyValue::Text(text));
        Frame::Continue
    }

    fn finish(&mut self) {
        self.state.finish();
    }
}

impl fmt::Debug for TextTween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextTween")
            .field("node", &self.state.node.id())
            .field("property", &self.state.property)
            .field("target", &self.state.target)
            .finish()
    }
}

/// Completes once another runner has completed or been cancelled.
#[derive(Debug, Clone)]
pub struct WaitFor {
    runner: TransformRunner,
}

impl WaitFor {
    pub fn new(runner: TransformRunner) -> Self {
        Self { runner }
    }
}

impl Transform for WaitFor {
    fn run_frame(&mut self, _time: f64) -> Frame {
        if self.runner.is_done() {
            Frame::Done
        } else {
            Frame::Continue
        }
    }

    fn finish(&mut self) {}
}
