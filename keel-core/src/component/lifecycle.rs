//! Component Lifecycle & Hierarchy
//!
//! A [`Component`] is a node with three lifecycle states:
//!
//! ```text
//!            enable()              destroy()
//! Disabled ───────────▶ Enabled ─────────────▶ Destroyed
//!     ▲                   │                        ▲
//!     └─── disable() ─────┘                        │
//!     └──────────────── destroy() ─────────────────┘
//! ```
//!
//! Components start disabled. Every transition is idempotent: enabling an
//! enabled component, disabling a disabled one, or touching a destroyed one
//! is a silent no-op, because transitions are routinely requested from many
//! uncoordinated call sites.
//!
//! # Hierarchy
//!
//! A parent exclusively owns the children added via
//! [`AsComponent::parent`]. Each child carries a [`ParentConfig`] that
//! independently controls whether enable, disable and destroy propagate from
//! the parent. Propagation runs after the parent's own callbacks.
//!
//! # Subscriptions
//!
//! Each component owns an [`EventHandler`] scoped to its enabled window.
//! Subscriptions made through [`ComponentEvents`] are re-established on every
//! enable and released on every disable.

use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::events::ComponentEvents;
use crate::error::{Error, Result};
use crate::event::{EventHandler, Signal};
use crate::key::{Key, KeyId};

/// Lifecycle state of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created, or disabled after being enabled.
    Disabled,
    /// Running.
    Enabled,
    /// Terminal.
    Destroyed,
}

/// Which transitions flow from a parent to a child.
///
/// Every flag defaults to `true`. Missing fields deserialize to their
/// default, so `{"enable": false}` is a complete config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentConfig {
    /// Enable the child whenever the parent is enabled.
    pub enable: bool,
    /// Disable the child whenever the parent is disabled.
    pub disable: bool,
    /// Destroy the child when the parent is destroyed.
    pub destroy: bool,
}

impl ParentConfig {
    /// Only destruction propagates; the child's enabled state is its own.
    pub const DESTROY_ONLY: Self = Self {
        enable: false,
        disable: false,
        destroy: true,
    };
}

impl Default for ParentConfig {
    fn default() -> Self {
        Self {
            enable: true,
            disable: true,
            destroy: true,
        }
    }
}

struct ParentedChild {
    component: Component,
    config: ParentConfig,
}

struct ComponentInner {
    id: KeyId,
    state: Cell<LifecycleState>,
    on_enable: Signal<()>,
    on_disable: Signal<()>,
    on_destroy: Signal<()>,
    events: EventHandler,
    children: RefCell<Vec<ParentedChild>>,
    typed: RefCell<HashMap<TypeId, (KeyId, Rc<dyn Any>)>>,
}

/// A lifecycle-managed node.
///
/// Cloning yields another handle to the same component.
///
/// # Example
///
/// ```rust
/// use keel_core::component::{AsComponent, Component};
///
/// let screen = Component::new();
/// let button = screen.parent(Component::new());
///
/// screen.enable();
/// assert!(button.is_enabled());
///
/// screen.destroy();
/// assert!(button.is_destroyed());
/// ```
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

impl Component {
    /// Create a new, disabled component.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ComponentInner {
                id: KeyId::new(),
                state: Cell::new(LifecycleState::Disabled),
                on_enable: Signal::new(),
                on_disable: Signal::new(),
                on_destroy: Signal::new(),
                events: EventHandler::new(),
                children: RefCell::new(Vec::new()),
                typed: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// The component's unique identity.
    pub fn id(&self) -> KeyId {
        self.inner.id
    }

    /// The current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.inner.state.get()
    }

    pub fn is_enabled(&self) -> bool {
        self.state() == LifecycleState::Enabled
    }

    pub fn is_destroyed(&self) -> bool {
        self.state() == LifecycleState::Destroyed
    }

    /// Enable the component, then every child configured to follow.
    pub fn enable(&self) {
        if self.state() != LifecycleState::Disabled {
            return;
        }

        self.inner.state.set(LifecycleState::Enabled);
        trace!(component = %self.id(), "component enabled");
        self.inner.on_enable.fire(&());

        if self.is_enabled() {
            for child in self.children_where(|config| config.enable) {
                child.enable();
            }
        }
    }

    /// Disable the component, releasing its per-enable subscriptions, then
    /// every child configured to follow.
    pub fn disable(&self) {
        if self.state() != LifecycleState::Enabled {
            return;
        }

        self.inner.state.set(LifecycleState::Disabled);
        trace!(component = %self.id(), "component disabled");
        self.inner.events.unsubscribe_all();
        self.inner.on_disable.fire(&());

        if self.state() == LifecycleState::Disabled {
            for child in self.children_where(|config| config.disable) {
                child.disable();
            }
        }
    }

    /// Disable if needed, then destroy the component and the children
    /// configured to follow. A second call is a no-op.
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }

        self.disable();
        if self.is_destroyed() {
            return;
        }

        self.inner.state.set(LifecycleState::Destroyed);
        trace!(component = %self.id(), "component destroyed");
        self.inner.on_destroy.fire(&());

        for child in self.children_where(|config| config.destroy) {
            child.destroy();
        }

        self.inner.on_enable.destroy();
        self.inner.on_disable.destroy();
        self.inner.on_destroy.destroy();
        self.inner.events.unsubscribe_all();
        self.inner.children.borrow_mut().clear();
        self.inner.typed.borrow_mut().clear();
    }

    /// Register a callback for every transition into `Enabled`.
    pub fn on_enable<F>(&self, func: F)
    where
        F: Fn() + 'static,
    {
        self.inner.on_enable.connect(move |_| func());
    }

    /// Register a callback for every transition out of `Enabled`.
    pub fn on_disable<F>(&self, func: F)
    where
        F: Fn() + 'static,
    {
        self.inner.on_disable.connect(move |_| func());
    }

    /// Register a callback for the one transition into `Destroyed`.
    ///
    /// Registering on a destroyed component does nothing.
    pub fn on_destroy<F>(&self, func: F)
    where
        F: Fn() + 'static,
    {
        self.inner.on_destroy.connect(move |_| func());
    }

    /// Take ownership of `child` with the given propagation config.
    ///
    /// The child is enabled right away when the parent is enabled and
    /// `config.enable` is set, and destroyed right away when the parent is
    /// already destroyed and `config.destroy` is set.
    pub fn parent_with<C>(&self, child: C, config: ParentConfig) -> C
    where
        C: AsComponent + Clone + 'static,
    {
        let component = child.component().clone();

        if self.is_destroyed() {
            if config.destroy {
                component.destroy();
            }
            return child;
        }

        if component.is_destroyed() {
            return child;
        }

        let id = component.id();
        self.inner.children.borrow_mut().push(ParentedChild {
            component: component.clone(),
            config,
        });
        self.inner
            .typed
            .borrow_mut()
            .insert(TypeId::of::<C>(), (id, Rc::new(child.clone())));

        let parent = Rc::downgrade(&self.inner);
        component.on_destroy(move || {
            if let Some(parent) = parent.upgrade() {
                parent.children.borrow_mut().retain(|child| child.component.id() != id);
                parent.typed.borrow_mut().retain(|_, (child, _)| *child != id);
            }
        });

        if config.enable && self.is_enabled() {
            component.enable();
        }

        child
    }

    /// Look up the most recently parented child of type `C`.
    pub fn get_component<C>(&self) -> Result<C>
    where
        C: Clone + 'static,
    {
        self.inner
            .typed
            .borrow()
            .get(&TypeId::of::<C>())
            .and_then(|(_, child)| child.downcast_ref::<C>())
            .cloned()
            .ok_or(Error::MissingChild {
                type_name: type_name::<C>(),
            })
    }

    /// Look up a child of type `C`, parenting a new one from `ctor` if none
    /// exists.
    pub fn get_or_add_component<C, F>(&self, ctor: F) -> C
    where
        C: AsComponent + Clone + 'static,
        F: FnOnce() -> C,
    {
        match self.get_component::<C>() {
            Ok(existing) => existing,
            Err(_) => self.parent_with(ctor(), ParentConfig::default()),
        }
    }

    /// The owned children. Destroyed children leave the list on their own.
    pub fn parented(&self) -> Vec<Component> {
        self.children_where(|_| true)
    }

    /// The event scope of this component.
    pub fn event(&self) -> ComponentEvents {
        ComponentEvents::new(self.downgrade(), self.inner.events.clone())
    }

    /// A weak handle that does not keep the component alive.
    pub fn downgrade(&self) -> WeakComponent {
        WeakComponent {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether both handles point at the same component.
    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn children_where<F>(&self, filter: F) -> Vec<Component>
    where
        F: Fn(&ParentConfig) -> bool,
    {
        self.inner
            .children
            .borrow()
            .iter()
            .filter(|child| filter(&child.config))
            .map(|child| child.component.clone())
            .collect()
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("children", &self.inner.children.borrow().len())
            .finish()
    }
}

impl From<&Component> for Key {
    fn from(component: &Component) -> Self {
        Key::Id(component.id())
    }
}

/// Weak handle to a [`Component`].
#[derive(Clone)]
pub struct WeakComponent {
    inner: Weak<ComponentInner>,
}

impl WeakComponent {
    /// Get the component back if it is still alive.
    pub fn upgrade(&self) -> Option<Component> {
        self.inner.upgrade().map(|inner| Component { inner })
    }
}

impl fmt::Debug for WeakComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakComponent")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Anything that is, or wraps, a [`Component`].
///
/// Implement [`component`](Self::component) and every lifecycle and
/// hierarchy operation comes for free.
pub trait AsComponent {
    /// The wrapped component.
    fn component(&self) -> &Component;

    fn id(&self) -> KeyId {
        self.component().id()
    }

    fn state(&self) -> LifecycleState {
        self.component().state()
    }

    fn is_enabled(&self) -> bool {
        self.component().is_enabled()
    }

    fn is_destroyed(&self) -> bool {
        self.component().is_destroyed()
    }

    fn enable(&self) {
        self.component().enable();
    }

    fn disable(&self) {
        self.component().disable();
    }

    fn destroy(&self) {
        self.component().destroy();
    }

    /// Enable or disable depending on `enabled`.
    fn set_enabled(&self, enabled: bool) {
        if enabled {
            self.component().enable();
        } else {
            self.component().disable();
        }
    }

    /// Flip between enabled and disabled.
    fn switch_enabled(&self) {
        self.set_enabled(!self.is_enabled());
    }

    fn on_enable<F>(&self, func: F)
    where
        F: Fn() + 'static,
    {
        self.component().on_enable(func);
    }

    fn on_disable<F>(&self, func: F)
    where
        F: Fn() + 'static,
    {
        self.component().on_disable(func);
    }

    fn on_destroy<F>(&self, func: F)
    where
        F: Fn() + 'static,
    {
        self.component().on_destroy(func);
    }

    /// Call `func(true)` on every enable and `func(false)` on every disable.
    fn on_enabled_state_change<F>(&self, func: F, execute_immediately: bool)
    where
        F: Fn(bool) + 'static,
    {
        let func = Rc::new(func);
        let on_enable = Rc::clone(&func);
        self.component().on_enable(move || on_enable(true));
        let on_disable = Rc::clone(&func);
        self.component().on_disable(move || on_disable(false));

        if execute_immediately {
            func(self.is_enabled());
        }
    }

    /// Parent `child` with every transition propagating, and return it.
    fn parent<C>(&self, child: C) -> C
    where
        C: AsComponent + Clone + 'static,
    {
        self.component().parent_with(child, ParentConfig::default())
    }

    fn parent_with<C>(&self, child: C, config: ParentConfig) -> C
    where
        C: AsComponent + Clone + 'static,
    {
        self.component().parent_with(child, config)
    }

    /// Parent `child` without tying its enabled state to this one.
    fn parent_destroy_only<C>(&self, child: C) -> C
    where
        C: AsComponent + Clone + 'static,
    {
        self.component().parent_with(child, ParentConfig::DESTROY_ONLY)
    }

    /// Parent `child` and return `self`, for builder-style setup.
    fn with_parented<C>(self, child: C) -> Self
    where
        C: AsComponent + Clone + 'static,
        Self: Sized,
    {
        self.parent(child);
        self
    }

    /// Run `func` on `self` and return `self`.
    fn with<F>(self, func: F) -> Self
    where
        F: FnOnce(&Self),
        Self: Sized,
    {
        func(&self);
        self
    }

    fn get_component<C>(&self) -> Result<C>
    where
        C: Clone + 'static,
    {
        self.component().get_component::<C>()
    }

    fn parented(&self) -> Vec<Component> {
        self.component().parented()
    }

    fn event(&self) -> ComponentEvents {
        self.component().event()
    }
}

impl AsComponent for Component {
    fn component(&self) -> &Component {
        self
    }
}
