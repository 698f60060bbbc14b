//! Fluent construction of transform sequences.

use std::borrow::Cow;
use std::fmt;

use smallvec::SmallVec;
use tracing::warn;

use super::primitives::{Delay, Func, TextTween, Tween, TweenTarget, WaitFor};
use super::property::{props, read_dim2, Color3, Dim, Dim2, NodeRef, PropertyValue};
use super::runner::TransformRunner;
use super::sequence::{ParallelTransformSequence, TransformSequence};
use super::service::TransformService;
use super::{EasingDirection, EasingStyle, IntoTransform, Transform, TransformProps};
use crate::component::AsComponent;
use crate::error::PropertyError;
use crate::key::Key;

type Group = SmallVec<[Box<dyn Transform>; 2]>;

/// Props of the tween that brings a flashed property back.
const FLASH_BACK: TransformProps =
    TransformProps::new(0.4, EasingStyle::Quad, EasingDirection::Out);

/// Collects transforms into parallel groups separated by [`then`](Self::then).
///
/// Every verb consumes the builder and returns it, so chains read top to
/// bottom. [`build_sequence`](Self::build_sequence) turns the groups into a
/// [`TransformSequence`] of [`ParallelTransformSequence`]s.
///
/// # Example
///
/// ```rust
/// use keel_core::host::Heartbeat;
/// use keel_core::transform::{transforms, Dim2, Node, TransformProps, TransformService};
///
/// let service = TransformService::new(Heartbeat::new());
/// let panel = Node::gui().into_ref();
///
/// let runner = transforms::create()
///     .show(&panel)
///     .move_to(&panel, Dim2::from_offset(0.0, 40.0), TransformProps::QUAD_OUT_02)
///     .fade_in(&panel, TransformProps::QUAD_OUT_02)
///     .then()
///     .wait(1.0)
///     .fade_out(&panel, TransformProps::QUAD_OUT_02)
///     .run(&service, "panel", false);
///
/// service.heartbeat().tick(0.2);
/// assert!(!runner.is_done());
/// ```
pub struct TransformBuilder {
    groups: Vec<Group>,
}

impl TransformBuilder {
    pub fn new() -> Self {
        Self {
            groups: vec![Group::new()],
        }
    }

    /// Add a transform to the current parallel group.
    pub fn push(mut self, transform: impl IntoTransform) -> Self {
        let transform = transform.into_transform();
        match self.groups.last_mut() {
            Some(group) => group.push(transform),
            None => self.groups.push(smallvec::smallvec![transform]),
        }
        self
    }

    /// Close the current group and start a new one.
    ///
    /// An empty group is never closed: `then()` on a fresh builder is a
    /// no-op, and several calls in a row yield a single group break.
    pub fn then(mut self) -> Self {
        if self.groups.last().is_some_and(|group| !group.is_empty()) {
            self.groups.push(Group::new());
        }
        self
    }

    /// Consume the builder.
    pub fn build_sequence(self) -> TransformSequence {
        TransformSequence::new(self.groups.into_iter().map(|group| {
            Box::new(ParallelTransformSequence::new(group)) as Box<dyn Transform>
        }))
    }

    /// Number of transforms added so far, across every group.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `func` once, in the current group.
    pub fn func<F>(self, func: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.push(Func::new(func))
    }

    /// Run `func` once and continue with the builder it returns, if any.
    pub fn dynamic<F>(self, func: F) -> Self
    where
        F: FnOnce() -> Option<TransformBuilder> + 'static,
    {
        self.push(Func::dynamic(func))
    }

    /// Wait `delay` seconds, then start a new group.
    pub fn wait(self, delay: f64) -> Self {
        self.push(Delay::new(delay)).then()
    }

    /// Run the given builders side by side as one step of this group.
    pub fn parallel<I>(self, builders: I) -> Self
    where
        I: IntoIterator<Item = TransformBuilder>,
    {
        self.push(ParallelTransformSequence::new(
            builders.into_iter().map(IntoTransform::into_transform),
        ))
    }

    /// Apply `func` `amount` times to a fresh builder, with a `then()` after
    /// each, and add the result as one step.
    pub fn repeat<F>(self, amount: usize, func: F) -> Self
    where
        F: Fn(TransformBuilder) -> TransformBuilder,
    {
        let mut repeated = TransformBuilder::new();
        for _ in 0..amount {
            repeated = func(repeated).then();
        }
        self.push(repeated)
    }

    /// Apply `func` only if `condition` holds.
    pub fn when<F>(self, condition: bool, func: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        if condition {
            func(self)
        } else {
            self
        }
    }

    /// Apply a reusable setup function.
    pub fn setup<F>(self, setup: F) -> Self
    where
        F: FnOnce(Self) -> Self,
    {
        setup(self)
    }

    /// Tween `property` of `node` to `value`.
    pub fn transform(
        self,
        node: &NodeRef,
        property: impl Into<Cow<'static, str>>,
        value: impl Into<PropertyValue>,
        props: TransformProps,
    ) -> Self {
        self.push(Tween::new(node.clone(), property, value, props))
    }

    /// Tween `property` of `node` to a target computed on the tween's first
    /// frame.
    pub fn transform_with<F>(
        self,
        node: &NodeRef,
        property: impl Into<Cow<'static, str>>,
        target: F,
        props: TransformProps,
    ) -> Self
    where
        F: Fn() -> Result<PropertyValue, PropertyError> + 'static,
    {
        self.push(Tween::with_target(
            node.clone(),
            property,
            TweenTarget::lazy(target),
            props,
        ))
    }

    /// Tween several properties of `node` side by side.
    pub fn transform_multi<I, P>(self, node: &NodeRef, values: I, props: TransformProps) -> Self
    where
        I: IntoIterator<Item = (P, PropertyValue)>,
        P: Into<Cow<'static, str>>,
    {
        values
            .into_iter()
            .fold(self, |builder, (property, value)| {
                builder.transform(node, property, value, props)
            })
    }

    pub fn move_to(self, node: &NodeRef, position: Dim2, props: TransformProps) -> Self {
        self.transform(node, props::POSITION, position, props)
    }

    /// Move horizontally, keeping the live Y position.
    pub fn move_x(self, node: &NodeRef, x: Dim, props: TransformProps) -> Self {
        let source = node.clone();
        self.transform_with(
            node,
            props::POSITION,
            move || {
                let current = read_dim2(&*source, props::POSITION)?;
                Ok(Dim2::new(x, current.y).into())
            },
            props,
        )
    }

    /// Move vertically, keeping the live X position.
    pub fn move_y(self, node: &NodeRef, y: Dim, props: TransformProps) -> Self {
        let source = node.clone();
        self.transform_with(
            node,
            props::POSITION,
            move || {
                let current = read_dim2(&*source, props::POSITION)?;
                Ok(Dim2::new(current.x, y).into())
            },
            props,
        )
    }

    /// Move by `offset` from wherever the node is when the tween starts.
    pub fn move_relative(self, node: &NodeRef, offset: Dim2, props: TransformProps) -> Self {
        self.relative(node, props::POSITION, offset, props)
    }

    pub fn resize(self, node: &NodeRef, size: Dim2, props: TransformProps) -> Self {
        self.transform(node, props::SIZE, size, props)
    }

    /// Grow by `offset` from the size the node has when the tween starts.
    pub fn resize_relative(self, node: &NodeRef, offset: Dim2, props: TransformProps) -> Self {
        self.relative(node, props::SIZE, offset, props)
    }

    fn relative(
        self,
        node: &NodeRef,
        property: &'static str,
        offset: Dim2,
        props: TransformProps,
    ) -> Self {
        let source = node.clone();
        self.transform_with(
            node,
            property,
            move || Ok((read_dim2(&*source, property)? + offset).into()),
            props,
        )
    }

    pub fn set_visible(self, node: &NodeRef, visible: bool) -> Self {
        self.transform(node, props::VISIBLE, visible, TransformProps::default())
    }

    pub fn show(self, node: &NodeRef) -> Self {
        self.set_visible(node, true)
    }

    pub fn hide(self, node: &NodeRef) -> Self {
        self.set_visible(node, false)
    }

    /// Tween transparency to `0`.
    pub fn fade_in(self, node: &NodeRef, props: TransformProps) -> Self {
        self.transform(node, props::TRANSPARENCY, 0.0, props)
    }

    /// Tween transparency to `1`.
    pub fn fade_out(self, node: &NodeRef, props: TransformProps) -> Self {
        self.transform(node, props::TRANSPARENCY, 1.0, props)
    }

    /// Snap to fully transparent, then fade in.
    pub fn fade_in_from_transparent(self, node: &NodeRef, props: TransformProps) -> Self {
        self.fade_out(node, TransformProps::default())
            .then()
            .fade_in(node, props)
    }

    /// Snap to fully opaque, then fade out.
    pub fn fade_out_from_opaque(self, node: &NodeRef, props: TransformProps) -> Self {
        self.fade_in(node, TransformProps::default())
            .then()
            .fade_out(node, props)
    }

    /// Tween `property` to `value` and back to the value it has now.
    ///
    /// Without `props` the flash is instant and the return takes 0.4 s; with
    /// `props` both legs use them.
    pub fn flash(
        self,
        node: &NodeRef,
        property: &'static str,
        value: impl Into<PropertyValue>,
        props: Option<TransformProps>,
    ) -> Self {
        let flash = TransformBuilder::new().transform(node, property, value, props.unwrap_or_default());

        let flash = match node.get(property) {
            Ok(original) => flash
                .then()
                .transform(node, property, original, props.unwrap_or(FLASH_BACK)),
            Err(error) => {
                warn!(node = %node.id(), property, %error, "flash cannot return to original value");
                flash
            }
        };

        self.push(flash)
    }

    /// Flash a color property, `BackgroundColor3` unless given.
    pub fn flash_color(
        self,
        node: &NodeRef,
        color: Color3,
        property: Option<&'static str>,
        props: Option<TransformProps>,
    ) -> Self {
        self.flash(node, property.unwrap_or(props::BACKGROUND_COLOR), color, props)
    }

    /// Type `text` into `property`, or erase it if `text` is empty.
    pub fn set_text(
        self,
        node: &NodeRef,
        property: impl Into<Cow<'static, str>>,
        text: impl Into<String>,
        props: TransformProps,
    ) -> Self {
        self.push(TextTween::new(node.clone(), property, text, props))
    }

    /// Wait until `runner` completes or is cancelled.
    pub fn wait_for_transform(self, runner: &TransformRunner) -> Self {
        self.push(WaitFor::new(runner.clone()))
    }

    /// Wait for whatever is running under `key` right now, if anything.
    pub fn wait_for_transform_of(self, service: &TransformService, key: impl Into<Key>) -> Self {
        match service.get_running(key) {
            Some(runner) => self.wait_for_transform(&runner),
            None => self,
        }
    }

    /// Wait for the transforms of every child parented to `component`.
    pub fn wait_for_transform_of_children<C>(self, service: &TransformService, component: &C) -> Self
    where
        C: AsComponent,
    {
        component
            .parented()
            .iter()
            .fold(self, |builder, child| {
                builder.wait_for_transform_of(service, Key::Id(child.id()))
            })
    }

    /// Start the built sequence under `key`.
    ///
    /// An existing transform under the same key is cancelled if
    /// `cancel_existing` is set and finished otherwise.
    pub fn run(
        self,
        service: &TransformService,
        key: impl Into<Key>,
        cancel_existing: bool,
    ) -> TransformRunner {
        service.run(key, self, cancel_existing)
    }
}

impl Default for TransformBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransformBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<usize> = self.groups.iter().map(|group| group.len()).collect();
        f.debug_struct("TransformBuilder")
            .field("groups", &groups)
            .finish()
    }
}
