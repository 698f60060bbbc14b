//! Keyed, optionally animated visibility of a node.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use super::lifecycle::{AsComponent, Component, WeakComponent};
use super::value_transform::ValueTransformContainer;
use crate::error::{PropertyError, Result};
use crate::event::{ObservableSwitch, ReadonlyObservable};
use crate::key::Key;
use crate::transform::{props, transforms, NodeRef, TransformBuilder, TransformService};

/// Vote used by the unkeyed `show`/`hide`/`set_visible`.
const MAIN_KEY: &str = "main";

/// Controls the `Visible` property of a node through an AND switch.
///
/// The node is visible only while no key votes to hide it. Changes go
/// through a [`ValueTransformContainer`], so registered transforms (a fade,
/// a slide) run before the node is hidden, and after it is shown.
///
/// The component is parented to its owner with destroy-only propagation
/// and can be looked up with `owner.get_component::<VisibilityComponent>()`.
/// Destroying it cancels any running transition.
#[derive(Clone)]
pub struct VisibilityComponent {
    component: Component,
    owner: WeakComponent,
    visibility: ObservableSwitch,
    transforming: ValueTransformContainer<bool>,
    service: TransformService,
    show_on_enable: Rc<Cell<bool>>,
}

impl VisibilityComponent {
    /// Attach visibility control of `node` to `owner`.
    ///
    /// Fails if `node` has no boolean `Visible` property.
    pub fn new<O>(owner: &O, node: NodeRef, service: &TransformService) -> Result<Self>
    where
        O: AsComponent,
    {
        let current = node.get(props::VISIBLE)?;
        let visible = current
            .as_bool()
            .ok_or_else(|| PropertyError::TypeMismatch {
                property: props::VISIBLE.to_string(),
                expected: "Bool",
                found: current.kind(),
            })?;

        let target = node.clone();
        let transforming = ValueTransformContainer::new(service, visible, move |visible: &bool| {
            if let Err(error) = target.set(props::VISIBLE, (*visible).into()) {
                warn!(node = %target.id(), %error, "visibility write failed");
            }
        });

        let shown = node.clone();
        transforming.add_transform(move |visible, builder| {
            if *visible {
                builder.show(&shown)
            } else {
                builder
            }
        });

        let visibility = ObservableSwitch::and(visible);
        let value = transforming.value().clone();
        visibility.subscribe(move |visible, _| value.set(*visible));

        let component = Component::new();
        let key = transforming.key();
        let on_destroy = service.clone();
        component.on_destroy(move || on_destroy.cancel(key.clone()));

        let this = Self {
            component,
            owner: owner.component().downgrade(),
            visibility,
            transforming,
            service: service.clone(),
            show_on_enable: Rc::new(Cell::new(false)),
        };

        Ok(owner.parent_destroy_only(this))
    }

    /// The switch deciding visibility.
    pub fn visibility(&self) -> &ObservableSwitch {
        &self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility.get()
    }

    /// What `key` currently votes; `true` if it has not voted.
    pub fn is_visible_keyed(&self, key: impl Into<Key>) -> bool {
        self.visibility.get_keyed(key)
    }

    pub fn show(&self) {
        self.set_visible(true);
    }

    pub fn hide(&self) {
        self.set_visible(false);
    }

    pub fn set_visible(&self, visible: bool) {
        self.visibility.set(MAIN_KEY, visible);
    }

    pub fn set_visible_keyed(&self, key: impl Into<Key>, visible: bool) {
        self.visibility.set(key, visible);
    }

    /// Run the builder made by `make` on every show (`on_show`) or every
    /// hide.
    pub fn add_transform<F>(&self, on_show: bool, make: F)
    where
        F: Fn() -> TransformBuilder + 'static,
    {
        self.add_transform_func(move |visible| {
            if visible == on_show {
                make()
            } else {
                transforms::create()
            }
        });
    }

    /// Run the builder made by `make` on every change, given the new
    /// visibility.
    pub fn add_transform_func<F>(&self, make: F)
    where
        F: Fn(bool) -> TransformBuilder + 'static,
    {
        self.transforming.add_transform(move |visible, builder| {
            let transition = make(*visible);
            if transition.is_empty() {
                builder
            } else {
                builder.push(transition)
            }
        });
    }

    /// A builder that waits for the running transition, if any.
    pub fn wait_for_transform(&self) -> TransformBuilder {
        transforms::create().wait_for_transform_of(&self.service, self.transforming.key())
    }

    /// Show the node while the owner is enabled and hide it while disabled.
    ///
    /// Only the first call has an effect.
    pub fn init_show_on_enable(self) -> Self {
        if self.show_on_enable.replace(true) {
            return self;
        }

        if let Some(owner) = self.owner.upgrade() {
            let visibility = self.visibility.clone();
            owner.on_enabled_state_change(move |enabled| visibility.set(MAIN_KEY, enabled), false);
        }
        self
    }
}

impl AsComponent for VisibilityComponent {
    fn component(&self) -> &Component {
        &self.component
    }
}

impl fmt::Debug for VisibilityComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityComponent")
            .field("component", &self.component)
            .field("visible", &self.is_visible())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Heartbeat;
    use crate::transform::{Node, PropertyValue, TransformProps};

    fn visible(node: &NodeRef) -> bool {
        node.get(props::VISIBLE).unwrap() == PropertyValue::Bool(true)
    }

    fn setup() -> (Component, NodeRef, TransformService, VisibilityComponent) {
        let owner = Component::new();
        let node = Node::gui().into_ref();
        let service = TransformService::new(Heartbeat::new());
        let visibility = VisibilityComponent::new(&owner, node.clone(), &service).unwrap();
        (owner, node, service, visibility)
    }

    #[test]
    fn any_hiding_key_hides() {
        let (_owner, node, _service, visibility) = setup();

        visibility.set_visible_keyed("loading", false);
        assert!(!visible(&node));
        assert!(!visibility.is_visible_keyed("loading"));
        assert!(visibility.is_visible_keyed("other"));

        visibility.show();
        assert!(!visible(&node));

        visibility.set_visible_keyed("loading", true);
        assert!(visible(&node));
    }

    #[test]
    fn hide_transform_runs_before_hiding() {
        let (_owner, node, service, visibility) = setup();
        let target = node.clone();
        visibility.add_transform(false, move || {
            transforms::create().fade_out(&target, TransformProps::QUAD_OUT_02)
        });

        visibility.hide();
        assert!(visible(&node));

        service.heartbeat().tick(0.2);
        service.heartbeat().tick(0.1);
        assert!(!visible(&node));
        assert_eq!(node.get(props::TRANSPARENCY).unwrap(), PropertyValue::Number(1.0));
    }

    #[test]
    fn show_makes_node_visible_right_away() {
        let (_owner, node, service, visibility) = setup();
        visibility.add_transform(true, {
            let target = node.clone();
            move || transforms::create().fade_in(&target, TransformProps::QUAD_OUT_02)
        });

        visibility.hide();
        service.heartbeat().tick(0.1);
        assert!(!visible(&node));

        visibility.show();
        assert!(visible(&node));
    }

    #[test]
    fn follows_owner_state_after_init() {
        let (owner, node, _service, visibility) = setup();
        let visibility = visibility.init_show_on_enable().init_show_on_enable();

        owner.enable();
        assert!(visible(&node));
        owner.disable();
        assert!(!visible(&node));
        assert!(!visibility.is_visible());
    }

    #[test]
    fn destroying_owner_cancels_transition() {
        let (owner, node, service, visibility) = setup();
        visibility.add_transform(false, {
            let target = node.clone();
            move || {
                transforms::create()
                    .wait(1.0)
                    .fade_out(&target, TransformProps::QUAD_OUT_02)
            }
        });

        visibility.hide();
        assert_eq!(service.running_count(), 1);

        owner.destroy();
        assert!(visibility.is_destroyed());
        assert_eq!(service.running_count(), 0);
        assert!(visible(&node));
    }

    #[test]
    fn owner_finds_it_by_type() {
        let (owner, _node, _service, visibility) = setup();
        let found = owner.get_component::<VisibilityComponent>().unwrap();
        assert!(found.component().ptr_eq(visibility.component()));
    }

    #[test]
    fn node_without_visible_is_rejected() {
        let owner = Component::new();
        let service = TransformService::new(Heartbeat::new());
        let result = VisibilityComponent::new(&owner, Node::new().into_ref(), &service);
        assert!(matches!(
            result,
            Err(crate::error::Error::Property(PropertyError::UnknownProperty { .. }))
        ));
    }
}
