//! Dynamic children containers.
//!
//! [`AsComponent::parent`] is for children that live as long as their
//! parent. The containers here are for children that come and go: list
//! items, keyed rows, a single swappable page. Each container is itself a
//! component. Children are enabled with it, disabled with it (or cleared,
//! with `clear_on_disable`), destroyed with it, and dropped from the
//! container when they are destroyed on their own.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::lifecycle::{AsComponent, Component, WeakComponent};
use crate::error::{Error, Result};
use crate::event::{ReadonlyObservable, Signal};

struct ChildrenState<T> {
    children: RefCell<Vec<T>>,
    clearing: Cell<bool>,
}

/// An ordered list of child components.
pub struct ComponentChildren<T: 'static> {
    component: Component,
    state: Rc<ChildrenState<T>>,
}

impl<T> ComponentChildren<T>
where
    T: AsComponent + Clone + 'static,
{
    /// Create an empty container. With `clear_on_disable`, disabling the
    /// container destroys and drops every child instead of disabling them.
    pub fn new(clear_on_disable: bool) -> Self {
        let this = Self {
            component: Component::new(),
            state: Rc::new(ChildrenState {
                children: RefCell::new(Vec::new()),
                clearing: Cell::new(false),
            }),
        };

        let on_enable = this.downgrade();
        this.component.on_enable(move || {
            if let Some(this) = on_enable.upgrade() {
                for child in this.get_all() {
                    child.enable();
                }
            }
        });

        let on_disable = this.downgrade();
        this.component.on_disable(move || {
            let Some(this) = on_disable.upgrade() else {
                return;
            };
            if clear_on_disable {
                this.clear();
            } else {
                for child in this.get_all() {
                    child.disable();
                }
            }
        });

        let on_destroy = this.downgrade();
        this.component.on_destroy(move || {
            if let Some(this) = on_destroy.upgrade() {
                this.clear();
            }
        });

        this
    }

    /// Add `child`, enabling it if the container is enabled.
    pub fn add(&self, child: T) -> T {
        self.state.children.borrow_mut().push(child.clone());

        let weak = self.downgrade();
        let id = child.id();
        child.on_destroy(move || {
            if let Some(this) = weak.upgrade() {
                if !this.state.clearing.get() {
                    this.state
                        .children
                        .borrow_mut()
                        .retain(|child| child.id() != id);
                }
            }
        });

        if self.component.is_enabled() {
            child.enable();
        }

        child
    }

    /// Drop `child` from the container and destroy it.
    pub fn remove(&self, child: &T) {
        let id = child.id();
        let removed = {
            let mut children = self.state.children.borrow_mut();
            let index = children.iter().position(|child| child.id() == id);
            index.map(|index| children.remove(index))
        };

        if let Some(removed) = removed {
            removed.destroy();
        }
    }

    /// Destroy and drop every child.
    pub fn clear(&self) {
        self.state.clearing.set(true);
        let children = std::mem::take(&mut *self.state.children.borrow_mut());
        for child in children {
            child.destroy();
        }
        self.state.clearing.set(false);
    }

    /// Snapshot of the current children.
    pub fn get_all(&self) -> Vec<T> {
        self.state.children.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.state.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn downgrade(&self) -> WeakChildren<T> {
        WeakChildren {
            component: self.component.downgrade(),
            state: Rc::downgrade(&self.state),
        }
    }
}

struct WeakChildren<T> {
    component: WeakComponent,
    state: Weak<ChildrenState<T>>,
}

impl<T: 'static> WeakChildren<T> {
    fn upgrade(&self) -> Option<ComponentChildren<T>> {
        Some(ComponentChildren {
            component: self.component.upgrade()?,
            state: self.state.upgrade()?,
        })
    }
}

impl<T: 'static> Clone for ComponentChildren<T> {
    fn clone(&self) -> Self {
        Self {
            component: self.component.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: 'static> AsComponent for ComponentChildren<T> {
    fn component(&self) -> &Component {
        &self.component
    }
}

impl<T: 'static> fmt::Debug for ComponentChildren<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentChildren")
            .field("component", &self.component)
            .field("len", &self.state.children.borrow().len())
            .finish()
    }
}

struct KeyedState<K, T> {
    children: RefCell<IndexMap<K, T>>,
    clearing: Cell<bool>,
}

/// Child components addressed by key, in insertion order.
pub struct ComponentKeyedChildren<K: 'static, T: 'static> {
    component: Component,
    state: Rc<KeyedState<K, T>>,
}

impl<K, T> ComponentKeyedChildren<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    T: AsComponent + Clone + 'static,
{
    /// Create an empty container. See [`ComponentChildren::new`].
    pub fn new(clear_on_disable: bool) -> Self {
        let this = Self {
            component: Component::new(),
            state: Rc::new(KeyedState {
                children: RefCell::new(IndexMap::new()),
                clearing: Cell::new(false),
            }),
        };

        let state = Rc::downgrade(&this.state);
        this.component.on_enable(move || {
            if let Some(state) = state.upgrade() {
                for child in Self::snapshot(&state) {
                    child.enable();
                }
            }
        });

        let weak = this.downgrade();
        this.component.on_disable(move || {
            let Some(this) = weak.upgrade() else {
                return;
            };
            if clear_on_disable {
                this.clear();
            } else {
                for child in this.values() {
                    child.disable();
                }
            }
        });

        let weak = this.downgrade();
        this.component.on_destroy(move || {
            if let Some(this) = weak.upgrade() {
                this.clear();
            }
        });

        this
    }

    /// Add `child` under `key`.
    ///
    /// An existing child under the same key is an error with
    /// `throw_if_exists`, and is destroyed and replaced otherwise.
    pub fn add(&self, key: K, child: T, throw_if_exists: bool) -> Result<T> {
        let replaced = {
            let mut children = self.state.children.borrow_mut();
            if throw_if_exists && children.contains_key(&key) {
                return Err(Error::duplicate_child(&key));
            }
            children.insert(key.clone(), child.clone())
        };

        if let Some(replaced) = replaced {
            replaced.destroy();
        }

        let weak = self.downgrade();
        let id = child.id();
        child.on_destroy(move || {
            let Some(this) = weak.upgrade() else {
                return;
            };
            if this.state.clearing.get() {
                return;
            }

            let mut children = this.state.children.borrow_mut();
            if children.get(&key).is_some_and(|current| current.id() == id) {
                children.shift_remove(&key);
            }
        });

        if self.component.is_enabled() {
            child.enable();
        }

        Ok(child)
    }

    pub fn get(&self, key: &K) -> Option<T> {
        self.state.children.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.state.children.borrow().contains_key(key)
    }

    /// Drop the child under `key` and destroy it.
    pub fn remove(&self, key: &K) {
        let removed = self.state.children.borrow_mut().shift_remove(key);
        if let Some(removed) = removed {
            removed.destroy();
        }
    }

    /// Destroy and drop every child.
    pub fn clear(&self) {
        self.state.clearing.set(true);
        let children = std::mem::take(&mut *self.state.children.borrow_mut());
        for (_, child) in children {
            child.destroy();
        }
        self.state.clearing.set(false);
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<K> {
        self.state.children.borrow().keys().cloned().collect()
    }

    /// Children in insertion order.
    pub fn values(&self) -> Vec<T> {
        Self::snapshot(&self.state)
    }

    pub fn get_all(&self) -> Vec<(K, T)> {
        self.state
            .children
            .borrow()
            .iter()
            .map(|(key, child)| (key.clone(), child.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(state: &KeyedState<K, T>) -> Vec<T> {
        state.children.borrow().values().cloned().collect()
    }

    fn downgrade(&self) -> WeakKeyedChildren<K, T> {
        WeakKeyedChildren {
            component: self.component.downgrade(),
            state: Rc::downgrade(&self.state),
        }
    }
}

struct WeakKeyedChildren<K, T> {
    component: WeakComponent,
    state: Weak<KeyedState<K, T>>,
}

impl<K: 'static, T: 'static> WeakKeyedChildren<K, T> {
    fn upgrade(&self) -> Option<ComponentKeyedChildren<K, T>> {
        Some(ComponentKeyedChildren {
            component: self.component.upgrade()?,
            state: self.state.upgrade()?,
        })
    }
}

impl<K: 'static, T: 'static> Clone for ComponentKeyedChildren<K, T> {
    fn clone(&self) -> Self {
        Self {
            component: self.component.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<K: 'static, T: 'static> AsComponent for ComponentKeyedChildren<K, T> {
    fn component(&self) -> &Component {
        &self.component
    }
}

impl<K: fmt::Debug + 'static, T: 'static> fmt::Debug for ComponentKeyedChildren<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentKeyedChildren")
            .field("component", &self.component)
            .field("keys", &self.state.children.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

struct ChildState<T: 'static> {
    child: RefCell<Option<T>>,
    child_set: Signal<Option<T>>,
}

/// Zero or one child component, swappable at any time.
pub struct ComponentChild<T: 'static> {
    component: Component,
    state: Rc<ChildState<T>>,
}

impl<T> ComponentChild<T>
where
    T: AsComponent + Clone + 'static,
{
    /// Create an empty slot. See [`ComponentChildren::new`].
    pub fn new(clear_on_disable: bool) -> Self {
        let this = Self {
            component: Component::new(),
            state: Rc::new(ChildState {
                child: RefCell::new(None),
                child_set: Signal::new(),
            }),
        };

        let weak = this.downgrade();
        this.component.on_enable(move || {
            if let Some(child) = weak.upgrade().and_then(|this| this.get()) {
                child.enable();
            }
        });

        let weak = this.downgrade();
        this.component.on_disable(move || {
            let Some(this) = weak.upgrade() else {
                return;
            };
            if clear_on_disable {
                this.clear();
            } else if let Some(child) = this.get() {
                child.disable();
            }
        });

        let weak = this.downgrade();
        this.component.on_destroy(move || {
            if let Some(this) = weak.upgrade() {
                this.clear();
            }
        });

        this
    }

    /// A slot whose child is rebuilt by `ctor` from every value of
    /// `observable` while enabled, and whenever the slot is emptied.
    pub fn from_observable<V, O, F>(observable: O, ctor: F, clear_on_disable: bool) -> Self
    where
        V: Clone + 'static,
        O: ReadonlyObservable<V> + Clone + 'static,
        F: Fn(V) -> T + 'static,
    {
        let this = Self::new(clear_on_disable);
        let ctor = Rc::new(ctor);

        let weak = this.downgrade();
        let build = Rc::clone(&ctor);
        this.component.event().subscribe_observable(
            &observable,
            move |value: &V, _| {
                if let Some(this) = weak.upgrade() {
                    this.set(Some(build(value.clone())));
                }
            },
            true,
            false,
        );

        let weak = this.downgrade();
        this.state.child_set.connect(move |child| {
            let Some(this) = weak.upgrade() else {
                return;
            };
            if child.is_none() && this.component.is_enabled() {
                this.set(Some(ctor(observable.get())));
            }
        });

        this
    }

    pub fn get(&self) -> Option<T> {
        self.state.child.borrow().clone()
    }

    /// Replace the child, destroying the previous one.
    pub fn set(&self, child: Option<T>) -> Option<T> {
        let prev = self.state.child.replace(child.clone());
        if let Some(prev) = prev {
            prev.destroy();
        }
        self.state.child_set.fire(&child);

        if let Some(child) = &child {
            if self.is_current(child) {
                let weak = self.downgrade();
                let id = child.id();
                child.on_destroy(move || {
                    if let Some(this) = weak.upgrade() {
                        let current = this.get().is_some_and(|current| current.id() == id);
                        if current {
                            this.set(None);
                        }
                    }
                });

                if self.component.is_enabled() {
                    child.enable();
                }
            }
        }

        child
    }

    /// Destroy the child, if any.
    pub fn clear(&self) {
        self.set(None);
    }

    /// Fired with the new child after each [`set`](Self::set).
    pub fn child_set(&self) -> &Signal<Option<T>> {
        &self.state.child_set
    }

    fn is_current(&self, child: &T) -> bool {
        self.state
            .child
            .borrow()
            .as_ref()
            .is_some_and(|current| current.id() == child.id())
    }

    fn downgrade(&self) -> WeakChild<T> {
        WeakChild {
            component: self.component.downgrade(),
            state: Rc::downgrade(&self.state),
        }
    }
}

struct WeakChild<T: 'static> {
    component: WeakComponent,
    state: Weak<ChildState<T>>,
}

impl<T: 'static> WeakChild<T> {
    fn upgrade(&self) -> Option<ComponentChild<T>> {
        Some(ComponentChild {
            component: self.component.upgrade()?,
            state: self.state.upgrade()?,
        })
    }
}

impl<T: 'static> Clone for ComponentChild<T> {
    fn clone(&self) -> Self {
        Self {
            component: self.component.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: 'static> AsComponent for ComponentChild<T> {
    fn component(&self) -> &Component {
        &self.component
    }
}

impl<T: 'static> fmt::Debug for ComponentChild<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentChild")
            .field("component", &self.component)
            .field("occupied", &self.state.child.borrow().is_some())
            .finish()
    }
}
