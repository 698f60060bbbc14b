//! Event Primitives
//!
//! The leaves of Keel's dependency order: everything else is built from
//! these.
//!
//! - [`Signal`]: a multi-subscriber event. Handlers are called synchronously,
//!   in connection order, on every fire.
//! - [`EventHandler`]: a bag of [`Connection`]s that can be released together.
//! - [`ObservableValue`]: one value plus an equality-gated change signal.
//! - [`ObservableSwitch`]: a boolean assembled from keyed votes.
//!
//! There is no dependency tracking and no deferred dispatch. A write
//! propagates to every subscriber before the call that made it returns.

mod handler;
mod observable;
mod signal;
mod switch;

pub use handler::EventHandler;
pub use observable::{ObservableValue, ReadonlyObservable, ReadonlyObservableValue};
pub use signal::{Connection, ConnectionId, Signal};
pub use switch::ObservableSwitch;
