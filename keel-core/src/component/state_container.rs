//! A component whose enabled state is voted on.

use super::lifecycle::{AsComponent, Component, ParentConfig};
use crate::event::{ObservableSwitch, ReadonlyObservable};
use crate::key::KeyId;

/// Wraps a child whose enabled state is driven by an AND switch.
///
/// The container votes its own enabled state into the switch, so the child
/// runs only while the container is enabled and no other key votes `false`.
/// Destroying the container destroys the child.
///
/// # Example
///
/// ```rust
/// use keel_core::component::{AsComponent, Component, ComponentStateContainer};
///
/// let screen = Component::new();
/// let tooltip = Component::new();
/// let enabled = ComponentStateContainer::create(&screen, tooltip.clone());
///
/// screen.enable();
/// assert!(tooltip.is_enabled());
///
/// enabled.set("dragging", false);
/// assert!(!tooltip.is_enabled());
/// ```
#[derive(Debug, Clone)]
pub struct ComponentStateContainer {
    component: Component,
    enabled: ObservableSwitch,
}

impl ComponentStateContainer {
    /// Wrap `child` in a new container parented to `parent` and return the
    /// switch controlling it.
    pub fn create<P, C>(parent: &P, child: C) -> ObservableSwitch
    where
        P: AsComponent,
        C: AsComponent + Clone + 'static,
    {
        let container = parent.parent(Self::new(child));
        container.enabled
    }

    pub fn new<C>(child: C) -> Self
    where
        C: AsComponent + Clone + 'static,
    {
        let component = Component::new();
        let enabled = ObservableSwitch::and(true);

        let own_vote = KeyId::new();
        let switch = enabled.clone();
        component.on_enabled_state_change(move |state| switch.set(own_vote, state), true);

        let child = component.parent_with(
            child,
            ParentConfig {
                enable: false,
                disable: false,
                destroy: true,
            },
        );
        enabled.subscribe_immediately(move |enabled, _| child.set_enabled(*enabled));

        Self { component, enabled }
    }

    /// The switch controlling the child.
    pub fn enabled(&self) -> &ObservableSwitch {
        &self.enabled
    }
}

impl AsComponent for ComponentStateContainer {
    fn component(&self) -> &Component {
        &self.component
    }
}
