//! Signal Implementation
//!
//! A Signal is the smallest event primitive in Keel: a list of handlers that
//! are all invoked, in connection order, whenever the signal fires.
//!
//! # How Signals Work
//!
//! 1. `connect` stores a handler and hands back a [`Connection`].
//!
//! 2. `fire` calls every handler that is still connected.
//!
//! 3. Dropping a `Connection` does nothing; it must be disconnected
//!    explicitly, either directly or through an
//!    [`EventHandler`](super::EventHandler) that owns it.
//!
//! # Reentrancy
//!
//! Handlers may connect, disconnect or fire other signals (and this one)
//! while a fire is in progress. `fire` works on a snapshot of the handler
//! list, and checks each handler is still connected right before calling it,
//! so a handler disconnected mid-fire is never called afterwards.
//!
//! # Threading
//!
//! Keel is single-threaded and frame-driven; signals use `Rc`/`RefCell` and
//! are neither `Send` nor `Sync`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

struct ConnectionState {
    id: ConnectionId,
    connected: Cell<bool>,
    detach: RefCell<Option<Box<dyn FnOnce()>>>,
}

/// Handle to a connected handler.
///
/// Cloning a connection yields another handle to the same subscription.
#[derive(Clone)]
pub struct Connection {
    state: Rc<ConnectionState>,
}

impl Connection {
    fn new(detach: Option<Box<dyn FnOnce()>>, connected: bool) -> Self {
        Self {
            state: Rc::new(ConnectionState {
                id: ConnectionId::new(),
                connected: Cell::new(connected),
                detach: RefCell::new(detach),
            }),
        }
    }

    /// A connection that is not attached to anything.
    pub fn detached() -> Self {
        Self::new(None, false)
    }

    /// A connection that runs `detach` once when disconnected.
    pub fn from_fn<F>(detach: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self::new(Some(Box::new(detach)), true)
    }

    /// Combine several connections into one that disconnects them all.
    pub fn multi<I>(connections: I) -> Self
    where
        I: IntoIterator<Item = Connection>,
    {
        let connections: Vec<Connection> = connections.into_iter().collect();
        Self::from_fn(move || {
            for connection in connections {
                connection.disconnect();
            }
        })
    }

    /// The connection's unique ID.
    pub fn id(&self) -> ConnectionId {
        self.state.id
    }

    /// Whether the handler is still attached.
    pub fn is_connected(&self) -> bool {
        self.state.connected.get()
    }

    /// Detach the handler. Calling this more than once is a no-op.
    pub fn disconnect(&self) {
        if !self.state.connected.replace(false) {
            return;
        }

        let detach = self.state.detach.borrow_mut().take();
        if let Some(detach) = detach {
            detach();
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.state.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

struct Handler<A> {
    state: Rc<ConnectionState>,
    func: Rc<dyn Fn(&A)>,
}

struct SignalInner<A> {
    handlers: Vec<Handler<A>>,
    destroyed: bool,
}

/// A multi-subscriber event carrying arguments of type `A`.
///
/// # Example
///
/// ```rust
/// use keel_core::event::Signal;
///
/// let clicked = Signal::<u32>::new();
/// let connection = clicked.connect(|button| println!("button {button}"));
///
/// clicked.fire(&1);
/// connection.disconnect();
/// clicked.fire(&2); // nothing printed
/// ```
pub struct Signal<A: 'static> {
    inner: Rc<RefCell<SignalInner<A>>>,
}

impl<A: 'static> Signal<A> {
    /// Create a new signal without handlers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                handlers: Vec::new(),
                destroyed: false,
            })),
        }
    }

    /// Connect a handler.
    ///
    /// Connecting to a destroyed signal returns an already disconnected
    /// connection and the handler is dropped.
    pub fn connect<F>(&self, func: F) -> Connection
    where
        F: Fn(&A) + 'static,
    {
        if self.inner.borrow().destroyed {
            return Connection::detached();
        }

        let weak: Weak<RefCell<SignalInner<A>>> = Rc::downgrade(&self.inner);
        let id = ConnectionId::new();
        let connection = Connection {
            state: Rc::new(ConnectionState {
                id,
                connected: Cell::new(true),
                detach: RefCell::new(Some(Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.borrow_mut().handlers.retain(|h| h.state.id != id);
                    }
                }))),
            }),
        };

        self.inner.borrow_mut().handlers.push(Handler {
            state: Rc::clone(&connection.state),
            func: Rc::new(func),
        });

        connection
    }

    /// Call every connected handler with `args`.
    pub fn fire(&self, args: &A) {
        let snapshot: SmallVec<[(Rc<ConnectionState>, Rc<dyn Fn(&A)>); 4]> = {
            let inner = self.inner.borrow();
            if inner.destroyed {
                return;
            }

            inner
                .handlers
                .iter()
                .map(|h| (Rc::clone(&h.state), Rc::clone(&h.func)))
                .collect()
        };

        for (state, func) in snapshot {
            if state.connected.get() {
                func(args);
            }
        }
    }

    /// Disconnect every handler. The signal stays usable.
    pub fn disconnect_all(&self) {
        let handlers = std::mem::take(&mut self.inner.borrow_mut().handlers);
        for handler in handlers {
            handler.state.connected.set(false);
            handler.state.detach.borrow_mut().take();
        }
    }

    /// Disconnect every handler and refuse new ones.
    pub fn destroy(&self) {
        self.disconnect_all();
        self.inner.borrow_mut().destroyed = true;
    }

    /// Whether [`destroy`](Self::destroy) was called.
    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().destroyed
    }

    /// Get the number of connected handlers.
    pub fn connection_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }
}

impl<A: 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> Clone for Signal<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connection_count", &self.connection_count())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_notifies_handlers_in_order() {
        let signal = Signal::<i32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log1 = log.clone();
        signal.connect(move |v| log1.borrow_mut().push(("first", *v)));
        let log2 = log.clone();
        signal.connect(move |v| log2.borrow_mut().push(("second", *v)));

        signal.fire(&7);
        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn disconnect_stops_notifications() {
        let signal = Signal::<()>::new();
        let calls = Rc::new(Cell::new(0));

        let calls_clone = calls.clone();
        let connection = signal.connect(move |_| calls_clone.set(calls_clone.get() + 1));

        signal.fire(&());
        connection.disconnect();
        connection.disconnect();
        signal.fire(&());

        assert_eq!(calls.get(), 1);
        assert!(!connection.is_connected());
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn handler_disconnected_mid_fire_is_skipped() {
        let signal = Signal::<()>::new();
        let calls = Rc::new(Cell::new(0));
        let second: Rc<RefCell<Option<Connection>>> = Rc::new(RefCell::new(None));

        let second_clone = second.clone();
        signal.connect(move |_| {
            if let Some(connection) = second_clone.borrow().as_ref() {
                connection.disconnect();
            }
        });
        let calls_clone = calls.clone();
        *second.borrow_mut() = Some(signal.connect(move |_| calls_clone.set(calls_clone.get() + 1)));

        signal.fire(&());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn destroyed_signal_ignores_everything() {
        let signal = Signal::<()>::new();
        let calls = Rc::new(Cell::new(0));

        let calls_clone = calls.clone();
        let before = signal.connect(move |_| calls_clone.set(calls_clone.get() + 1));
        signal.destroy();

        let calls_clone = calls.clone();
        let after = signal.connect(move |_| calls_clone.set(calls_clone.get() + 1));
        signal.fire(&());

        assert_eq!(calls.get(), 0);
        assert!(!before.is_connected());
        assert!(!after.is_connected());
        assert!(signal.is_destroyed());
    }

    #[test]
    fn multi_connection_disconnects_all() {
        let a = Signal::<()>::new();
        let b = Signal::<()>::new();

        let combined = Connection::multi([a.connect(|_| {}), b.connect(|_| {})]);
        assert_eq!(a.connection_count() + b.connection_count(), 2);

        combined.disconnect();
        assert_eq!(a.connection_count() + b.connection_count(), 0);
    }

    #[test]
    fn signal_clone_shares_handlers() {
        let signal1 = Signal::<()>::new();
        let signal2 = signal1.clone();
        let calls = Rc::new(Cell::new(0));

        let calls_clone = calls.clone();
        signal1.connect(move |_| calls_clone.set(calls_clone.get() + 1));
        signal2.fire(&());

        assert_eq!(calls.get(), 1);
    }
}
