//! A value whose changes are animated before they land.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::event::{ObservableValue, ReadonlyObservable};
use crate::key::{Key, KeyId};
use crate::transform::{transforms, TransformBuilder, TransformService};

type MakeTransform<T> = Rc<dyn Fn(&T, TransformBuilder) -> TransformBuilder>;

struct ContainerInner<T: 'static> {
    key: KeyId,
    value: ObservableValue<T>,
    transforms: RefCell<Vec<MakeTransform<T>>>,
    set: Rc<dyn Fn(&T)>,
    service: TransformService,
}

impl<T> ContainerInner<T>
where
    T: Clone + PartialEq + 'static,
{
    fn apply(&self, value: &T) {
        let makers = self.transforms.borrow().clone();
        let builders: Vec<TransformBuilder> = makers
            .iter()
            .map(|make| make(value, transforms::create()))
            .filter(|builder| !builder.is_empty())
            .collect();

        if builders.is_empty() {
            self.service.cancel(self.key);
            (self.set)(value);
            return;
        }

        let set = Rc::clone(&self.set);
        let value = value.clone();
        transforms::create()
            .push(transforms::parallel(builders))
            .then()
            .func(move || set(&value))
            .run(&self.service, self.key, true);
    }
}

/// An observable value applied through transforms.
///
/// Every change runs all registered transforms side by side, then applies
/// the new value through the `set` callback. A change arriving while the
/// previous one is still animating cancels it, so its value is never
/// applied. When no transform has anything to do for a change, the value is
/// applied synchronously.
pub struct ValueTransformContainer<T: 'static> {
    inner: Rc<ContainerInner<T>>,
}

impl<T> ValueTransformContainer<T>
where
    T: Clone + PartialEq + 'static,
{
    pub fn new<F>(service: &TransformService, value: T, set: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        let inner = Rc::new(ContainerInner {
            key: KeyId::new(),
            value: ObservableValue::new(value),
            transforms: RefCell::new(Vec::new()),
            set: Rc::new(set),
            service: service.clone(),
        });

        let weak: Weak<ContainerInner<T>> = Rc::downgrade(&inner);
        inner.value.subscribe(move |value, _| {
            if let Some(inner) = weak.upgrade() {
                inner.apply(value);
            }
        });

        Self { inner }
    }

    /// Add a transform that runs on every change, given the new value.
    pub fn add_transform<F>(&self, make: F)
    where
        F: Fn(&T, TransformBuilder) -> TransformBuilder + 'static,
    {
        self.inner.transforms.borrow_mut().push(Rc::new(make));
    }

    /// The value; writing it starts the transition.
    pub fn value(&self) -> &ObservableValue<T> {
        &self.inner.value
    }

    pub fn get(&self) -> T {
        self.inner.value.get()
    }

    pub fn set(&self, value: T) {
        self.inner.value.set(value);
    }

    /// Key the transitions run under in the service.
    pub fn key(&self) -> Key {
        Key::Id(self.inner.key)
    }
}

impl<T: 'static> Clone for ValueTransformContainer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ValueTransformContainer<T>
where
    T: fmt::Debug + Clone + PartialEq + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueTransformContainer")
            .field("key", &self.inner.key)
            .field("value", &self.inner.value.get())
            .field("transforms", &self.inner.transforms.borrow().len())
            .finish()
    }
}
