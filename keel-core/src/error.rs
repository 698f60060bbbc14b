//! Error types.
//!
//! Lifecycle no-ops (double enable, destroy after destroy, ...) are not errors
//! and never show up here. What does show up are wiring mistakes made by the
//! integrating code, and failures reported by the host's property bag.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced to the integrating application.
#[derive(Debug, Error)]
pub enum Error {
    /// A typed child lookup found nothing of the requested type.
    #[error("component does not contain a child of type `{type_name}`")]
    MissingChild { type_name: &'static str },

    /// A keyed child was inserted under a key that is already taken.
    #[error("child with the key `{key}` already exists")]
    DuplicateChild { key: String },

    /// The property bag rejected a read or a write.
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// An animation preset could not be parsed.
    #[error("invalid transform configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Failures reported by a [`PropertyBag`](crate::transform::PropertyBag).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    /// The node has no property with this name.
    #[error("unknown property `{property}`")]
    UnknownProperty { property: String },

    /// The value does not have the kind the property holds.
    #[error("property `{property}` holds {expected}, got {found}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The property cannot be written, e.g. because its node is being torn down.
    #[error("property `{property}` is read-only")]
    ReadOnly { property: String },
}

impl Error {
    pub(crate) fn duplicate_child(key: &impl fmt::Debug) -> Self {
        Error::DuplicateChild {
            key: format!("{key:?}"),
        }
    }
}
