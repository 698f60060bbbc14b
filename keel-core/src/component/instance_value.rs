//! Layered, animated values for node properties.
//!
//! Several parts of a widget often want a say in the same property: a hover
//! highlight, a pressed state, a disabled look. [`InstanceValueStorage`]
//! gives each property of a node one [`InstanceValue`], where every caller
//! owns a layer. The highest layer wins, any `and` vote can force a boolean
//! property off, and the result reaches the node through its transforms.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::warn;

use super::lifecycle::{AsComponent, Component};
use super::overlay::OverlayValueStorage;
use super::value_transform::ValueTransformContainer;
use crate::error::Result;
use crate::key::Key;
use crate::transform::{NodeRef, PropertyValue, TransformService};

/// Fold position of `and` votes: after every layer.
const AND_ORDER: i64 = i64::MAX;

/// One property of a node, assembled from layers and votes.
///
/// Changes of the effective value run the registered transforms before they
/// are written to the node; see [`ValueTransformContainer`].
#[derive(Clone)]
pub struct InstanceValue {
    layers: OverlayValueStorage<PropertyValue>,
    transforms: ValueTransformContainer<PropertyValue>,
}

impl InstanceValue {
    fn new(node: NodeRef, property: Cow<'static, str>, service: &TransformService) -> Result<Self> {
        let current = node.get(&property)?;

        let transforms = ValueTransformContainer::new(service, current.clone(), move |value: &PropertyValue| {
            if let Err(error) = node.set(&property, value.clone()) {
                warn!(node = %node.id(), property = %property, %error, "instance value write failed");
            }
        });

        let layers = OverlayValueStorage::new(current);
        let target = transforms.clone();
        layers
            .changed()
            .connect(move |change: &(PropertyValue, PropertyValue)| target.set(change.0.clone()));

        Ok(Self { layers, transforms })
    }

    /// Set the layer at `z_index`; `None` clears it.
    ///
    /// The highest layer with a value wins. With no layers left the property
    /// returns to the value it had when the storage first touched it.
    pub fn overlay(&self, z_index: i64, value: Option<PropertyValue>) {
        let slot = Key::from(format!("layer:{z_index}")).at(z_index);
        self.layers.overlay(slot, value);
    }

    /// Vote on a boolean property; any `false` vote forces it to `false`
    /// whatever the layers say. `None` withdraws the vote.
    pub fn and(&self, key: impl Into<Key>, value: Option<bool>) {
        let slot = key.into().at(AND_ORDER);
        match value {
            Some(true) => self.layers.effect(slot, |fold| fold),
            Some(false) => self.layers.effect(slot, |_| PropertyValue::Bool(false)),
            None => self.layers.remove(slot.key().clone()),
        }
    }

    /// The effective value, which the node reaches once its transforms
    /// have run.
    pub fn get(&self) -> PropertyValue {
        self.layers.get()
    }

    /// The transforms run on every change before the value is written.
    pub fn transforms(&self) -> &ValueTransformContainer<PropertyValue> {
        &self.transforms
    }

    fn release(&self) {
        self.layers.destroy();
    }
}

impl fmt::Debug for InstanceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceValue")
            .field("value", &self.get())
            .field("layers", &self.layers.effect_count())
            .finish()
    }
}

struct StorageInner {
    node: NodeRef,
    service: TransformService,
    values: RefCell<IndexMap<Cow<'static, str>, InstanceValue>>,
}

/// The [`InstanceValue`]s of one node, created on first use.
///
/// Destroying the storage cancels every running transition and stops the
/// values from following their upstream observables.
#[derive(Clone)]
pub struct InstanceValueStorage {
    component: Component,
    inner: Rc<StorageInner>,
}

impl InstanceValueStorage {
    /// Create an enabled storage for `node`.
    pub fn new(node: NodeRef, service: &TransformService) -> Self {
        let storage = Self {
            component: Component::new(),
            inner: Rc::new(StorageInner {
                node,
                service: service.clone(),
                values: RefCell::new(IndexMap::new()),
            }),
        };

        let inner = Rc::downgrade(&storage.inner);
        storage.component.on_destroy(move || {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let values: Vec<InstanceValue> = inner.values.borrow().values().cloned().collect();
            for value in values {
                value.release();
                inner.service.cancel(value.transforms.key());
            }
        });

        storage.component.enable();
        storage
    }

    /// The storage parented to `owner`, created for `node` on first call.
    ///
    /// Later calls return the existing storage and ignore `node`.
    pub fn of<O>(owner: &O, node: NodeRef, service: &TransformService) -> Self
    where
        O: AsComponent,
    {
        owner
            .component()
            .get_or_add_component(|| Self::new(node, service))
    }

    /// The value of `property`, created from its current value on first use.
    ///
    /// Fails if the node has no such property.
    pub fn get(&self, property: impl Into<Cow<'static, str>>) -> Result<InstanceValue> {
        let property = property.into();
        if let Some(existing) = self.inner.values.borrow().get(&property) {
            return Ok(existing.clone());
        }

        let value = InstanceValue::new(self.inner.node.clone(), property.clone(), &self.inner.service)?;
        self.inner
            .values
            .borrow_mut()
            .insert(property, value.clone());
        Ok(value)
    }

    /// Capture the current value of every listed property up front.
    pub fn add_default_values<I, P>(&self, properties: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<Cow<'static, str>>,
    {
        for property in properties {
            self.get(property)?;
        }
        Ok(())
    }

    /// The node this storage writes to.
    pub fn node(&self) -> &NodeRef {
        &self.inner.node
    }

    /// Number of properties with a value.
    pub fn len(&self) -> usize {
        self.inner.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AsComponent for InstanceValueStorage {
    fn component(&self) -> &Component {
        &self.component
    }
}

impl fmt::Debug for InstanceValueStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceValueStorage")
            .field("node", &self.inner.node.id())
            .field("properties", &self.inner.values.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}
