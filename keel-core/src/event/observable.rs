//! Observable values.
//!
//! An [`ObservableValue`] stores one value and fires `changed` with
//! `(value, prev)` whenever a `set` actually changes it. Writes that leave the
//! value equal to what it was are swallowed, which is what lets chains of
//! derived observables settle instead of ping-ponging.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::signal::{Connection, Signal};

/// Read access to a changing value.
///
/// Implemented by every value-like type in Keel, so any of them can be fed
/// into an [`OverlayValueStorage`](crate::component::OverlayValueStorage) or
/// subscribed to from a component.
pub trait ReadonlyObservable<T: Clone + 'static> {
    /// The current value.
    fn get(&self) -> T;

    /// Signal fired with `(value, prev)` after each change.
    fn changed(&self) -> Signal<(T, T)>;

    /// Subscribe to changes.
    fn subscribe<F>(&self, func: F) -> Connection
    where
        F: Fn(&T, &T) + 'static,
        Self: Sized,
    {
        self.changed()
            .connect(move |args: &(T, T)| func(&args.0, &args.1))
    }

    /// Subscribe to changes and call `func(current, current)` right away.
    fn subscribe_immediately<F>(&self, func: F) -> Connection
    where
        F: Fn(&T, &T) + 'static,
        Self: Sized,
    {
        let func = Rc::new(func);
        let handler = Rc::clone(&func);
        let connection = self
            .changed()
            .connect(move |args: &(T, T)| handler(&args.0, &args.1));

        let current = self.get();
        func(&current, &current);
        connection
    }
}

struct ObservableInner<T: 'static> {
    value: RefCell<T>,
    changed: Signal<(T, T)>,
    middleware: Option<Rc<dyn Fn(T) -> T>>,
}

/// A single mutable value with an equality-gated change signal.
///
/// Cloning yields another handle to the same value.
///
/// # Example
///
/// ```rust
/// use keel_core::event::{ObservableValue, ReadonlyObservable};
///
/// let volume = ObservableValue::new(0.5);
/// volume.subscribe(|value, prev| println!("{prev} -> {value}"));
///
/// volume.set(0.8); // prints "0.5 -> 0.8"
/// volume.set(0.8); // unchanged, nothing printed
/// ```
pub struct ObservableValue<T: 'static> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> ObservableValue<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a new observable holding `value`.
    pub fn new(value: T) -> Self {
        Self::build(value, None)
    }

    /// Create an observable that passes every written value through
    /// `middleware` before storing it.
    ///
    /// The initial value is stored as given.
    pub fn with_middleware<F>(value: T, middleware: F) -> Self
    where
        F: Fn(T) -> T + 'static,
    {
        Self::build(value, Some(Rc::new(middleware)))
    }

    fn build(value: T, middleware: Option<Rc<dyn Fn(T) -> T>>) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                changed: Signal::new(),
                middleware,
            }),
        }
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Store a new value, firing `changed` if it differs from the old one.
    pub fn set(&self, value: T) {
        let value = match &self.inner.middleware {
            Some(middleware) => middleware(value),
            None => value,
        };

        let prev = {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            std::mem::replace(&mut *current, value.clone())
        };

        self.inner.changed.fire(&(value, prev));
    }

    /// Update the value using a function of the current one.
    pub fn update<F>(&self, func: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = func(&self.inner.value.borrow());
        self.set(next);
    }

    /// The change signal.
    pub fn changed(&self) -> &Signal<(T, T)> {
        &self.inner.changed
    }

    /// A handle that can only read and subscribe.
    pub fn as_readonly(&self) -> ReadonlyObservableValue<T> {
        ReadonlyObservableValue {
            source: self.clone(),
        }
    }

    /// Derive a read-only observable that follows this one through `func`.
    pub fn create_based<U, F>(&self, func: F) -> ReadonlyObservableValue<U>
    where
        U: Clone + PartialEq + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let derived = ObservableValue::new(func(&self.get()));
        let target = derived.clone();
        self.subscribe(move |value, _| target.set(func(value)));

        derived.as_readonly()
    }

    /// Keep `other` equal to this value, starting now.
    pub fn auto_set(&self, other: &ObservableValue<T>) -> Connection {
        let other = other.clone();
        self.subscribe_immediately(move |value, _| other.set(value.clone()))
    }
}

impl ObservableValue<f64> {
    /// A number observable clamped to `[min, max]`, optionally rounded to
    /// multiples of `step`.
    pub fn clamped(value: f64, min: f64, max: f64, step: Option<f64>) -> Self {
        let clamp = move |value: f64| {
            let value = match step {
                Some(step) if step > 0.0 => (value / step).round() * step,
                _ => value,
            };
            value.clamp(min, max)
        };

        Self::with_middleware(clamp(value), clamp)
    }
}

impl<T> ReadonlyObservable<T> for ObservableValue<T>
where
    T: Clone + PartialEq + 'static,
{
    fn get(&self) -> T {
        ObservableValue::get(self)
    }

    fn changed(&self) -> Signal<(T, T)> {
        self.inner.changed.clone()
    }
}

impl<T: 'static> Clone for ObservableValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for ObservableValue<T>
where
    T: Clone + PartialEq + Default + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for ObservableValue<T>
where
    T: fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.inner.changed.connection_count())
            .finish()
    }
}

/// Read-only view of an [`ObservableValue`].
pub struct ReadonlyObservableValue<T: 'static> {
    source: ObservableValue<T>,
}

impl<T> ReadonlyObservable<T> for ReadonlyObservableValue<T>
where
    T: Clone + PartialEq + 'static,
{
    fn get(&self) -> T {
        self.source.get()
    }

    fn changed(&self) -> Signal<(T, T)> {
        self.source.changed().clone()
    }
}

impl<T: 'static> Clone for ReadonlyObservableValue<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T> fmt::Debug for ReadonlyObservableValue<T>
where
    T: fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadonlyObservableValue")
            .field(&self.source)
            .finish()
    }
}
