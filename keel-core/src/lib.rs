//! Keel Core
//!
//! This crate provides the core runtime for the Keel reactive UI component
//! framework. It implements:
//!
//! - Event primitives (signals, observable values, keyed switches)
//! - A component lifecycle with parent/child propagation
//! - Overlay storage: one value folded from many keyed contributions
//! - A frame-driven transform engine for animating node properties
//!
//! Everything is single-threaded and synchronous: a write reaches every
//! subscriber before the call that made it returns, and animations advance
//! only when the host ticks its [`Heartbeat`](host::Heartbeat).
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `event`: Signals, connections, observable values and switches
//! - `component`: Lifecycle, hierarchy and the containers built on it
//! - `transform`: Easing, tweens, sequences, runners and the keyed registry
//! - `host`: The frame clock supplied by the embedding application
//! - `key`: Identity keys used by every keyed collection
//!
//! # Example
//!
//! ```rust
//! use keel_core::component::{Component, VisibilityComponent};
//! use keel_core::host::Heartbeat;
//! use keel_core::transform::{props, transforms, Node, PropertyValue, TransformProps, TransformService};
//!
//! let heartbeat = Heartbeat::new();
//! let service = TransformService::new(heartbeat.clone());
//!
//! let screen = Component::new();
//! let panel = Node::gui().into_ref();
//! let visibility = VisibilityComponent::new(&screen, panel.clone(), &service)
//!     .unwrap()
//!     .init_show_on_enable();
//!
//! let fading = panel.clone();
//! visibility.add_transform(false, move || {
//!     transforms::create().fade_out(&fading, TransformProps::QUAD_OUT_02)
//! });
//!
//! screen.enable();
//! screen.disable();
//!
//! // The fade runs first; the panel is hidden once it is done.
//! heartbeat.tick(0.2);
//! heartbeat.tick(0.1);
//! assert_eq!(panel.get(props::VISIBLE).unwrap(), PropertyValue::Bool(false));
//! ```

pub mod component;
pub mod error;
pub mod event;
pub mod host;
pub mod key;
pub mod transform;

pub use error::{Error, PropertyError, Result};
