//! Identity keys.
//!
//! Many places in Keel need to address "one slot per caller": overlay effects,
//! switch assertions, and the transform registry. A [`Key`] is either a static
//! name chosen by the caller or an opaque identity handed out by a counter,
//! so two distinct objects never collide even if their names do.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identity for a keyed object.
///
/// Components, visual nodes and ad-hoc owners draw their identities from the
/// same counter, which keeps identity keys unique across the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(u64);

impl KeyId {
    /// Generate a new unique identity.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for KeyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A key addressing one slot in a keyed collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A caller-chosen name.
    Name(Cow<'static, str>),
    /// An object identity.
    Id(KeyId),
}

impl Key {
    /// Attach an explicit fold position to this key.
    pub fn at(self, order: i64) -> Slot {
        Slot {
            key: self,
            order: Some(order),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Id(id) => id.fmt(f),
        }
    }
}

impl From<&'static str> for Key {
    fn from(name: &'static str) -> Self {
        Key::Name(Cow::Borrowed(name))
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(Cow::Owned(name))
    }
}

impl From<KeyId> for Key {
    fn from(id: KeyId) -> Self {
        Key::Id(id)
    }
}

/// A key together with an optional explicit position in an ordered fold.
///
/// Slots without an explicit order are placed by registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub(crate) key: Key,
    pub(crate) order: Option<i64>,
}

impl Slot {
    /// Create a slot placed by registration order.
    pub fn new(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            order: None,
        }
    }

    /// Force this slot to a fixed position in the fold.
    pub fn at(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// The key of this slot.
    pub fn key(&self) -> &Key {
        &self.key
    }
}

impl From<Key> for Slot {
    fn from(key: Key) -> Self {
        Slot::new(key)
    }
}

impl From<&'static str> for Slot {
    fn from(name: &'static str) -> Self {
        Slot::new(name)
    }
}

impl From<String> for Slot {
    fn from(name: String) -> Self {
        Slot::new(name)
    }
}

impl From<KeyId> for Slot {
    fn from(id: KeyId) -> Self {
        Slot::new(id)
    }
}
