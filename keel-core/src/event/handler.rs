//! Event handler: a bag of connections that can be torn down at once.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use super::signal::{Connection, Signal};

/// Owns a set of connections and disconnects them together.
///
/// Components use one of these per enabled window: everything subscribed
/// while enabled is registered here and released on disable.
#[derive(Clone, Default)]
pub struct EventHandler {
    connections: Rc<RefCell<SmallVec<[Connection; 4]>>>,
}

impl EventHandler {
    /// Create an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an existing connection.
    pub fn register(&self, connection: Connection) {
        let mut connections = self.connections.borrow_mut();
        connections.retain(|c| c.is_connected());
        connections.push(connection);
    }

    /// Connect `func` to `signal` and keep the connection.
    pub fn subscribe<A, F>(&self, signal: &Signal<A>, func: F) -> Connection
    where
        A: 'static,
        F: Fn(&A) + 'static,
    {
        let connection = signal.connect(func);
        self.register(connection.clone());
        connection
    }

    /// Disconnect every owned connection.
    pub fn unsubscribe_all(&self) {
        let connections = std::mem::take(&mut *self.connections.borrow_mut());
        for connection in connections {
            connection.disconnect();
        }
    }

    /// Get the number of live connections.
    pub fn len(&self) -> usize {
        self.connections
            .borrow()
            .iter()
            .filter(|c| c.is_connected())
            .count()
    }

    /// Whether no live connection is owned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("connections", &self.len())
            .finish()
    }
}
