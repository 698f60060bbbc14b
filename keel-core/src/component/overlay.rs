//! Overlay Value Storage
//!
//! One logical value assembled from many independent contributions.
//!
//! Every caller owns a keyed slot and asserts a contribution into it: a plain
//! value, an observable to follow, or an arbitrary `T -> T` function. The
//! effective value is a left fold of those contributions over a seed:
//!
//! ```text
//! seed ─▶ [order 1: and a] ─▶ [order 2: and b] ─▶ [order 3: or c] ─▶ value
//! ```
//!
//! # Ordering
//!
//! Slots are folded by ascending order index, ties broken by registration
//! order. A slot without an explicit index has index `0`, so unindexed slots
//! fold in the order they were first registered. Re-registering a key
//! replaces its contribution without moving it.
//!
//! # Emission
//!
//! The fold is recomputed synchronously on every registration and on every
//! upstream change, and stored in an [`ObservableValue`], so `changed` only
//! fires when the effective value really moved.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::event::{
    Connection, ObservableSwitch, ObservableValue, ReadonlyObservable, ReadonlyObservableValue,
    Signal,
};
use crate::key::{Key, Slot};

/// Truthiness used by the `and`/`or` combinators.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl<U> Truthy for Option<U> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

/// A contribution asserted into an [`OverlayValueStorage`].
pub enum Input<T: 'static> {
    /// A fixed value.
    Value(T),
    /// A value that follows an observable.
    Observable(Rc<dyn ReadonlyObservable<T>>),
    /// No contribution; registering this removes the slot.
    Absent,
}

impl<T: Clone + 'static> Input<T> {
    /// Follow `observable`.
    pub fn observable<O>(observable: O) -> Self
    where
        O: ReadonlyObservable<T> + 'static,
    {
        Input::Observable(Rc::new(observable))
    }

    fn current(&self) -> Option<T> {
        match self {
            Input::Value(value) => Some(value.clone()),
            Input::Observable(observable) => Some(observable.get()),
            Input::Absent => None,
        }
    }
}

impl<T: 'static> From<Option<T>> for Input<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Input::Value(value),
            None => Input::Absent,
        }
    }
}

impl<T> From<ObservableValue<T>> for Input<T>
where
    T: Clone + PartialEq + 'static,
{
    fn from(observable: ObservableValue<T>) -> Self {
        Input::Observable(Rc::new(observable))
    }
}

impl<T> From<ReadonlyObservableValue<T>> for Input<T>
where
    T: Clone + PartialEq + 'static,
{
    fn from(observable: ReadonlyObservableValue<T>) -> Self {
        Input::Observable(Rc::new(observable))
    }
}

impl<T> From<OverlayValueStorage<T>> for Input<T>
where
    T: Clone + PartialEq + 'static,
{
    fn from(storage: OverlayValueStorage<T>) -> Self {
        Input::Observable(Rc::new(storage))
    }
}

impl From<ObservableSwitch> for Input<bool> {
    fn from(switch: ObservableSwitch) -> Self {
        Input::Observable(Rc::new(switch))
    }
}

type EffectFn<T> = Rc<dyn Fn(T) -> T>;

struct Effect<T> {
    order: i64,
    seq: u64,
    func: EffectFn<T>,
    connection: Option<Connection>,
}

struct OverlayInner<T: 'static> {
    default_value: T,
    default_computing_value: RefCell<T>,
    effects: RefCell<IndexMap<Key, Effect<T>>>,
    next_seq: Cell<u64>,
    value: ObservableValue<T>,
}

/// A single value settable from many places at once.
///
/// # Example
///
/// ```rust
/// use keel_core::component::OverlayValueStorage;
/// use keel_core::key::Key;
///
/// // Interactable only while every constraint agrees.
/// let interactable = OverlayValueStorage::new(true);
/// interactable.and("loading", Some(false));
/// assert!(!interactable.get());
///
/// interactable.and("loading", None);
/// assert!(interactable.get());
///
/// // Explicit positions fold first regardless of call order.
/// let label = OverlayValueStorage::new(String::new());
/// label.overlay(Key::from("late").at(10), Some("late".to_string()));
/// label.overlay(Key::from("early").at(-10), Some("early".to_string()));
/// assert_eq!(label.get(), "late");
/// ```
pub struct OverlayValueStorage<T: 'static> {
    inner: Rc<OverlayInner<T>>,
}

impl<T> OverlayValueStorage<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a storage whose fold is seeded with `default_value`.
    pub fn new(default_value: T) -> Self {
        Self::with_computing_value(default_value.clone(), default_value)
    }

    /// Create a storage that reports `default_value` while empty and seeds
    /// the fold with `default_computing_value` otherwise.
    pub fn with_computing_value(default_value: T, default_computing_value: T) -> Self {
        Self {
            inner: Rc::new(OverlayInner {
                value: ObservableValue::new(default_value.clone()),
                default_value,
                default_computing_value: RefCell::new(default_computing_value),
                effects: RefCell::new(IndexMap::new()),
                next_seq: Cell::new(0),
            }),
        }
    }

    /// Replace the fold with `input` at `slot`.
    pub fn overlay(&self, slot: impl Into<Slot>, input: impl Into<Input<T>>) {
        self.register_input(slot.into(), input.into(), |_, value| value);
    }

    /// Run an arbitrary function at `slot`.
    pub fn effect<F>(&self, slot: impl Into<Slot>, func: F)
    where
        F: Fn(T) -> T + 'static,
    {
        self.register(slot.into(), Rc::new(func), None);
    }

    /// Remove the contribution at `key`, whatever its kind.
    pub fn remove(&self, key: impl Into<Key>) {
        let key = key.into();
        let removed = self.inner.effects.borrow_mut().shift_remove(&key);
        if let Some(effect) = removed {
            if let Some(connection) = effect.connection {
                connection.disconnect();
            }
            self.update();
        }
    }

    /// Re-seed the fold and recompute.
    pub fn set_default_computing_value(&self, value: T) {
        *self.inner.default_computing_value.borrow_mut() = value;
        self.update();
    }

    /// The effective value.
    pub fn get(&self) -> T {
        self.inner.value.get()
    }

    /// Read-only view of the effective value.
    pub fn value(&self) -> ReadonlyObservableValue<T> {
        self.inner.value.as_readonly()
    }

    /// Fired with `(value, prev)` whenever the effective value changes.
    pub fn changed(&self) -> &Signal<(T, T)> {
        self.inner.value.changed()
    }

    /// Number of registered slots.
    pub fn effect_count(&self) -> usize {
        self.inner.effects.borrow().len()
    }

    /// Release every upstream subscription.
    ///
    /// Registered contributions stay in place, but observable-sourced ones
    /// stop triggering recomputation.
    pub fn destroy(&self) {
        let connections: SmallVec<[Connection; 4]> = self
            .inner
            .effects
            .borrow_mut()
            .values_mut()
            .filter_map(|effect| effect.connection.take())
            .collect();

        for connection in connections {
            connection.disconnect();
        }
    }

    fn register_input(&self, slot: Slot, input: Input<T>, apply: fn(T, T) -> T) {
        if let Input::Absent = input {
            self.remove(slot.key);
            return;
        }

        let connection = match &input {
            Input::Observable(observable) => {
                let weak: Weak<OverlayInner<T>> = Rc::downgrade(&self.inner);
                Some(observable.changed().connect(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        OverlayValueStorage { inner }.update();
                    }
                }))
            }
            _ => None,
        };

        let func = Rc::new(move |fold: T| match input.current() {
            Some(value) => apply(fold, value),
            None => fold,
        });

        self.register(slot, func, connection);
    }

    fn register(
        &self,
        slot: Slot,
        func: EffectFn<T>,
        connection: Option<Connection>,
    ) {
        let replaced = {
            let mut effects = self.inner.effects.borrow_mut();
            match effects.get_mut(&slot.key) {
                Some(existing) => {
                    existing.func = func;
                    std::mem::replace(&mut existing.connection, connection)
                }
                None => {
                    let seq = self.inner.next_seq.get();
                    self.inner.next_seq.set(seq + 1);
                    effects.insert(
                        slot.key,
                        Effect {
                            order: slot.order.unwrap_or(0),
                            seq,
                            func,
                            connection,
                        },
                    );
                    None
                }
            }
        };

        if let Some(previous) = replaced {
            previous.disconnect();
        }

        self.update();
    }

    fn calculate(&self) -> T {
        let mut ordered: SmallVec<[(i64, u64, EffectFn<T>); 8]> = {
            let effects = self.inner.effects.borrow();
            if effects.is_empty() {
                return self.inner.default_value.clone();
            }

            effects
                .values()
                .map(|effect| (effect.order, effect.seq, Rc::clone(&effect.func)))
                .collect()
        };
        ordered.sort_by_key(|(order, seq, _)| (*order, *seq));

        let seed = self.inner.default_computing_value.borrow().clone();
        ordered.into_iter().fold(seed, |value, (_, _, func)| func(value))
    }

    fn update(&self) {
        let value = self.calculate();
        self.inner.value.set(value);
    }
}

impl<T> OverlayValueStorage<T>
where
    T: Clone + PartialEq + Truthy + 'static,
{
    /// Combine `input` into the fold with short-circuit AND.
    pub fn and(&self, slot: impl Into<Slot>, input: impl Into<Input<T>>) {
        self.register_input(slot.into(), input.into(), |fold, value| {
            if fold.is_truthy() {
                value
            } else {
                fold
            }
        });
    }

    /// Combine `input` into the fold with short-circuit OR.
    pub fn or(&self, slot: impl Into<Slot>, input: impl Into<Input<T>>) {
        self.register_input(slot.into(), input.into(), |fold, value| {
            if fold.is_truthy() {
                fold
            } else {
                value
            }
        });
    }
}

impl<T> ReadonlyObservable<T> for OverlayValueStorage<T>
where
    T: Clone + PartialEq + 'static,
{
    fn get(&self) -> T {
        OverlayValueStorage::get(self)
    }

    fn changed(&self) -> Signal<(T, T)> {
        OverlayValueStorage::changed(self).clone()
    }
}

impl<T: 'static> Clone for OverlayValueStorage<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for OverlayValueStorage<T>
where
    T: fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let effects = self.inner.effects.borrow();
        f.debug_struct("OverlayValueStorage")
            .field("value", &self.inner.value)
            .field(
                "effects",
                &effects
                    .iter()
                    .map(|(key, effect)| (key, effect.order))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
