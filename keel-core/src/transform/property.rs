//! Animatable properties of visual nodes.
//!
//! The host owns the real visual tree. Keel only needs to read and write
//! named properties on it, which is what [`PropertyBag`] abstracts. [`Node`]
//! is an in-memory bag for hosts without their own and for tests.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::{Add, Sub};
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::PropertyError;
use crate::key::{Key, KeyId};

/// Well-known property names.
pub mod props {
    pub const POSITION: &str = "Position";
    pub const SIZE: &str = "Size";
    pub const VISIBLE: &str = "Visible";
    pub const TRANSPARENCY: &str = "Transparency";
    pub const BACKGROUND_COLOR: &str = "BackgroundColor3";
    pub const TEXT: &str = "Text";
}

fn lerp(from: f64, to: f64, alpha: f64) -> f64 {
    from + (to - from) * alpha
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color3 {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color3 {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }
}

/// One layout axis: a fraction of the parent plus a pixel offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dim {
    pub scale: f64,
    pub offset: f64,
}

impl Dim {
    pub const fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }
}

impl Add for Dim {
    type Output = Dim;

    fn add(self, rhs: Dim) -> Dim {
        Dim::new(self.scale + rhs.scale, self.offset + rhs.offset)
    }
}

impl Sub for Dim {
    type Output = Dim;

    fn sub(self, rhs: Dim) -> Dim {
        Dim::new(self.scale - rhs.scale, self.offset - rhs.offset)
    }
}

/// A two-axis layout value, used for positions and sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dim2 {
    pub x: Dim,
    pub y: Dim,
}

impl Dim2 {
    pub const fn new(x: Dim, y: Dim) -> Self {
        Self { x, y }
    }

    pub const fn from_scale(x: f64, y: f64) -> Self {
        Self::new(Dim::new(x, 0.0), Dim::new(y, 0.0))
    }

    pub const fn from_offset(x: f64, y: f64) -> Self {
        Self::new(Dim::new(0.0, x), Dim::new(0.0, y))
    }
}

impl Add for Dim2 {
    type Output = Dim2;

    fn add(self, rhs: Dim2) -> Dim2 {
        Dim2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Dim2 {
    type Output = Dim2;

    fn sub(self, rhs: Dim2) -> Dim2 {
        Dim2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Number(f64),
    Bool(bool),
    Vector2(Vector2),
    Color3(Color3),
    Dim2(Dim2),
    Text(String),
}

impl PropertyValue {
    /// Name of the value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Number(_) => "Number",
            PropertyValue::Bool(_) => "Bool",
            PropertyValue::Vector2(_) => "Vector2",
            PropertyValue::Color3(_) => "Color3",
            PropertyValue::Dim2(_) => "Dim2",
            PropertyValue::Text(_) => "Text",
        }
    }

    /// Interpolate towards `to` by eased progress `alpha`.
    ///
    /// Numeric kinds interpolate per component. `Bool` and `Text` hold
    /// `self` until `alpha` reaches 1. Returns `None` if the kinds differ.
    pub fn lerp(&self, to: &PropertyValue, alpha: f64) -> Option<PropertyValue> {
        let value = match (self, to) {
            (PropertyValue::Number(a), PropertyValue::Number(b)) => {
                PropertyValue::Number(lerp(*a, *b, alpha))
            }
            (PropertyValue::Vector2(a), PropertyValue::Vector2(b)) => {
                PropertyValue::Vector2(Vector2::new(lerp(a.x, b.x, alpha), lerp(a.y, b.y, alpha)))
            }
            (PropertyValue::Color3(a), PropertyValue::Color3(b)) => PropertyValue::Color3(Color3::new(
                lerp(a.r, b.r, alpha),
                lerp(a.g, b.g, alpha),
                lerp(a.b, b.b, alpha),
            )),
            (PropertyValue::Dim2(a), PropertyValue::Dim2(b)) => PropertyValue::Dim2(Dim2::new(
                Dim::new(lerp(a.x.scale, b.x.scale, alpha), lerp(a.x.offset, b.x.offset, alpha)),
                Dim::new(lerp(a.y.scale, b.y.scale, alpha), lerp(a.y.offset, b.y.offset, alpha)),
            )),
            (PropertyValue::Bool(_), PropertyValue::Bool(_))
            | (PropertyValue::Text(_), PropertyValue::Text(_)) => {
                if alpha >= 1.0 {
                    to.clone()
                } else {
                    self.clone()
                }
            }
            _ => return None,
        };

        Some(value)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_dim2(&self) -> Option<Dim2> {
        match self {
            PropertyValue::Dim2(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<Vector2> for PropertyValue {
    fn from(value: Vector2) -> Self {
        PropertyValue::Vector2(value)
    }
}

impl From<Color3> for PropertyValue {
    fn from(value: Color3) -> Self {
        PropertyValue::Color3(value)
    }
}

impl From<Dim2> for PropertyValue {
    fn from(value: Dim2) -> Self {
        PropertyValue::Dim2(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

/// Named, typed properties of one visual node.
pub trait PropertyBag {
    /// Identity of the node, used to key its transforms.
    fn id(&self) -> KeyId;

    fn get(&self, property: &str) -> Result<PropertyValue, PropertyError>;

    fn set(&self, property: &str, value: PropertyValue) -> Result<(), PropertyError>;
}

/// Shared handle to a property bag.
pub type NodeRef = Rc<dyn PropertyBag>;

/// Key under which transforms of `node` are registered.
pub fn node_key(node: &NodeRef) -> Key {
    Key::Id(node.id())
}

pub(crate) fn read_dim2(node: &dyn PropertyBag, property: &str) -> Result<Dim2, PropertyError> {
    let value = node.get(property)?;
    value.as_dim2().ok_or_else(|| PropertyError::TypeMismatch {
        property: property.to_string(),
        expected: "Dim2",
        found: value.kind(),
    })
}

/// An in-memory property bag.
///
/// Properties are declared up front; writing an undeclared property or a
/// value of a different kind is an error.
pub struct Node {
    id: KeyId,
    properties: RefCell<IndexMap<Cow<'static, str>, PropertyValue>>,
    locked: Cell<bool>,
}

impl Node {
    /// A node without properties.
    pub fn new() -> Self {
        Self {
            id: KeyId::new(),
            properties: RefCell::new(IndexMap::new()),
            locked: Cell::new(false),
        }
    }

    /// A node with the common GUI properties at their defaults: origin
    /// position, zero size, visible, opaque, white, no text.
    pub fn gui() -> Self {
        Self::new()
            .with_property(props::POSITION, Dim2::default())
            .with_property(props::SIZE, Dim2::default())
            .with_property(props::VISIBLE, true)
            .with_property(props::TRANSPARENCY, 0.0)
            .with_property(props::BACKGROUND_COLOR, Color3::new(1.0, 1.0, 1.0))
            .with_property(props::TEXT, "")
    }

    /// Declare `property` with an initial value.
    pub fn with_property(
        self,
        property: impl Into<Cow<'static, str>>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties
            .borrow_mut()
            .insert(property.into(), value.into());
        self
    }

    /// Reject every further write, as a host does for a node being torn down.
    pub fn lock(&self) {
        self.locked.set(true);
    }

    /// Wrap in a shared handle.
    pub fn into_ref(self) -> NodeRef {
        Rc::new(self)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyBag for Node {
    fn id(&self) -> KeyId {
        self.id
    }

    fn get(&self, property: &str) -> Result<PropertyValue, PropertyError> {
        self.properties
            .borrow()
            .get(property)
            .cloned()
            .ok_or_else(|| PropertyError::UnknownProperty {
                property: property.to_string(),
            })
    }

    fn set(&self, property: &str, value: PropertyValue) -> Result<(), PropertyError> {
        if self.locked.get() {
            return Err(PropertyError::ReadOnly {
                property: property.to_string(),
            });
        }

        let mut properties = self.properties.borrow_mut();
        let Some(current) = properties.get_mut(property) else {
            return Err(PropertyError::UnknownProperty {
                property: property.to_string(),
            });
        };

        if current.kind() != value.kind() {
            return Err(PropertyError::TypeMismatch {
                property: property.to_string(),
                expected: current.kind(),
                found: value.kind(),
            });
        }

        *current = value;
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("properties", &*self.properties.borrow())
            .field("locked", &self.locked.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_rejects_unknown_and_mismatched_writes() {
        let node = Node::gui();

        assert!(matches!(
            node.set("Rotation", 5.0.into()),
            Err(PropertyError::UnknownProperty { .. })
        ));
        assert!(matches!(
            node.set(props::VISIBLE, 1.0.into()),
            Err(PropertyError::TypeMismatch { expected: "Bool", found: "Number", .. })
        ));

        node.set(props::TRANSPARENCY, 0.5.into()).unwrap();
        assert_eq!(node.get(props::TRANSPARENCY).unwrap(), PropertyValue::Number(0.5));
    }

    #[test]
    fn locked_node_is_read_only() {
        let node = Node::gui();
        node.lock();

        assert!(matches!(
            node.set(props::TRANSPARENCY, 1.0.into()),
            Err(PropertyError::ReadOnly { .. })
        ));
    }

    #[test]
    fn lerp_numeric_kinds() {
        let from = PropertyValue::from(Dim2::from_offset(0.0, 10.0));
        let to = PropertyValue::from(Dim2::from_offset(100.0, 20.0));

        assert_eq!(
            from.lerp(&to, 0.5),
            Some(PropertyValue::Dim2(Dim2::from_offset(50.0, 15.0)))
        );
        assert_eq!(
            PropertyValue::Color3(Color3::new(0.0, 0.0, 0.0))
                .lerp(&PropertyValue::Color3(Color3::new(1.0, 0.5, 0.0)), 0.5),
            Some(PropertyValue::Color3(Color3::new(0.5, 0.25, 0.0)))
        );
    }

    #[test]
    fn bool_snaps_at_completion() {
        let from = PropertyValue::Bool(false);
        let to = PropertyValue::Bool(true);

        assert_eq!(from.lerp(&to, 0.99), Some(PropertyValue::Bool(false)));
        assert_eq!(from.lerp(&to, 1.0), Some(PropertyValue::Bool(true)));
    }

    #[test]
    fn lerp_across_kinds_fails() {
        assert_eq!(PropertyValue::Number(0.0).lerp(&PropertyValue::Bool(true), 0.5), None);
    }

    #[test]
    fn dim2_arithmetic() {
        let moved = Dim2::from_scale(0.5, 0.5) + Dim2::from_offset(10.0, -10.0);
        assert_eq!(moved, Dim2::new(Dim::new(0.5, 10.0), Dim::new(0.5, -10.0)));
        assert_eq!(moved - Dim2::from_offset(10.0, -10.0), Dim2::from_scale(0.5, 0.5));
    }
}
