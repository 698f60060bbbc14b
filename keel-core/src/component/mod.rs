//! Components
//!
//! A [`Component`] is a node in an ownership tree with a three-state
//! lifecycle:
//!
//! ```text
//!            enable              destroy
//! Disabled ─────────▶ Enabled ─────────▶ Destroyed
//!     ▲                  │
//!     └──────────────────┘
//!            disable
//! ```
//!
//! Transitions propagate to parented children after the parent's own
//! callbacks have run, as configured per child by [`ParentConfig`].
//! Subscriptions made through [`ComponentEvents`] live only while their
//! component is enabled.
//!
//! Anything wrapping a component implements [`AsComponent`] and inherits the
//! lifecycle and hierarchy operations. The containers in this module are
//! built that way:
//!
//! - [`ComponentChildren`], [`ComponentKeyedChildren`], [`ComponentChild`]:
//!   dynamic child collections.
//! - [`ComponentStateContainer`]: a child enabled by vote.
//! - [`VisibilityComponent`]: keyed, animated visibility of a node.
//!
//! [`OverlayValueStorage`] and [`ValueTransformContainer`] are the value-side
//! counterparts: one value assembled from many keyed contributions, and one
//! value whose changes are animated before they land.
//! [`InstanceValueStorage`] joins the two for the properties of a node.

mod children;
mod events;
mod instance_value;
mod lifecycle;
mod overlay;
mod state_container;
mod value_transform;
mod visibility;

pub use children::{ComponentChild, ComponentChildren, ComponentKeyedChildren};
pub use events::ComponentEvents;
pub use instance_value::{InstanceValue, InstanceValueStorage};
pub use lifecycle::{AsComponent, Component, LifecycleState, ParentConfig, WeakComponent};
pub use overlay::{Input, OverlayValueStorage, Truthy};
pub use state_container::ComponentStateContainer;
pub use value_transform::ValueTransformContainer;
pub use visibility::VisibilityComponent;
