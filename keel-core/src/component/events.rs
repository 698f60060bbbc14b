//! Subscriptions scoped to a component's enabled window.

use std::fmt;
use std::rc::Rc;

use super::lifecycle::WeakComponent;
use crate::event::{Connection, EventHandler, ReadonlyObservable, Signal};

/// Subscription helpers bound to one component.
///
/// Every subscription made here is established when the component is
/// enabled (immediately, if it already is) and released when it is
/// disabled, so handlers never run while their component is off.
///
/// Obtained from [`AsComponent::event`](super::AsComponent::event).
#[derive(Clone)]
pub struct ComponentEvents {
    component: WeakComponent,
    handler: EventHandler,
}

impl ComponentEvents {
    pub(crate) fn new(component: WeakComponent, handler: EventHandler) -> Self {
        Self { component, handler }
    }

    /// Run `func` on every enable, and right away if `execute_immediately`
    /// is set and the component is enabled.
    pub fn on_enable<F>(&self, func: F, execute_immediately: bool)
    where
        F: Fn() + 'static,
    {
        let Some(component) = self.component.upgrade() else {
            return;
        };

        let func = Rc::new(func);
        let on_enable = Rc::clone(&func);
        component.on_enable(move || on_enable());

        if execute_immediately && component.is_enabled() {
            func();
        }
    }

    /// Connect `func` to `signal` for as long as the component is enabled.
    pub fn subscribe<A, F>(&self, signal: &Signal<A>, func: F)
    where
        A: 'static,
        F: Fn(&A) + 'static,
    {
        let func = Rc::new(func);
        let signal = signal.clone();
        let handler = self.handler.clone();

        self.while_enabled(move || {
            let func = Rc::clone(&func);
            handler.subscribe(&signal, move |args| func(args));
        });
    }

    /// Call `register` on every enable and own whatever connection it
    /// returns until the next disable.
    pub fn subscribe_registration<F>(&self, register: F)
    where
        F: Fn() -> Option<Connection> + 'static,
    {
        let handler = self.handler.clone();
        self.while_enabled(move || {
            if let Some(connection) = register() {
                handler.register(connection);
            }
        });
    }

    /// Subscribe `func` to `signal`, optionally also running it on every
    /// enable and right away.
    pub fn subscribe_immediately<A, F>(
        &self,
        signal: &Signal<A>,
        func: F,
        execute_on_enable: bool,
        execute_immediately: bool,
    ) where
        A: 'static,
        F: Fn() + 'static,
    {
        let func = Rc::new(func);
        let on_fire = Rc::clone(&func);
        self.subscribe(signal, move |_| on_fire());

        if execute_on_enable {
            let on_enable = Rc::clone(&func);
            self.on_enable(move || on_enable(), false);
        }
        if execute_immediately {
            func();
        }
    }

    /// Subscribe to `observable`'s changes while enabled.
    ///
    /// With `execute_on_enable`, `func(current, current)` also runs on every
    /// enable; with `execute_immediately`, it also runs now if enabled.
    pub fn subscribe_observable<T, O, F>(
        &self,
        observable: &O,
        func: F,
        execute_on_enable: bool,
        execute_immediately: bool,
    ) where
        T: Clone + 'static,
        O: ReadonlyObservable<T> + Clone + 'static,
        F: Fn(&T, &T) + 'static,
    {
        let func = Rc::new(func);
        let on_change = Rc::clone(&func);
        self.subscribe(&observable.changed(), move |args: &(T, T)| {
            on_change(&args.0, &args.1)
        });

        if execute_on_enable {
            let observable = observable.clone();
            self.on_enable(
                move || {
                    let current = observable.get();
                    func(&current, &current);
                },
                execute_immediately,
            );
        }
    }

    /// The handler owning this component's per-enable connections.
    pub fn handler(&self) -> &EventHandler {
        &self.handler
    }

    fn while_enabled<F>(&self, subscribe: F)
    where
        F: Fn() + 'static,
    {
        let Some(component) = self.component.upgrade() else {
            return;
        };
        if component.is_destroyed() {
            return;
        }

        let subscribe = Rc::new(subscribe);
        let on_enable = Rc::clone(&subscribe);
        component.on_enable(move || on_enable());

        if component.is_enabled() {
            subscribe();
        }
    }
}

impl fmt::Debug for ComponentEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentEvents")
            .field("component", &self.component)
            .field("handler", &self.handler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::component::{AsComponent, Component};
    use crate::event::ObservableValue;

    #[test]
    fn subscription_lives_only_while_enabled() {
        let component = Component::new();
        let signal = Signal::<i32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        component
            .event()
            .subscribe(&signal, move |v| seen_clone.borrow_mut().push(*v));

        signal.fire(&1);
        component.enable();
        signal.fire(&2);
        component.disable();
        signal.fire(&3);
        component.enable();
        signal.fire(&4);

        assert_eq!(*seen.borrow(), vec![2, 4]);
    }

    #[test]
    fn subscribing_while_enabled_connects_now() {
        let component = Component::new();
        component.enable();

        let signal = Signal::<()>::new();
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        component
            .event()
            .subscribe(&signal, move |_| calls_clone.set(calls_clone.get() + 1));

        signal.fire(&());
        assert_eq!(calls.get(), 1);
        assert_eq!(signal.connection_count(), 1);
    }

    #[test]
    fn re_enabling_does_not_duplicate_handlers() {
        let component = Component::new();
        let signal = Signal::<()>::new();
        component.event().subscribe(&signal, |_| {});

        for _ in 0..3 {
            component.enable();
            component.disable();
        }
        component.enable();

        assert_eq!(signal.connection_count(), 1);
    }

    #[test]
    fn destroy_releases_subscriptions() {
        let component = Component::new();
        let signal = Signal::<()>::new();
        component.event().subscribe(&signal, |_| {});

        component.enable();
        component.destroy();

        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn subscribe_observable_runs_on_enable() {
        let component = Component::new();
        let value = ObservableValue::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        component.event().subscribe_observable(
            &value,
            move |v, prev| seen_clone.borrow_mut().push((*v, *prev)),
            true,
            false,
        );

        component.enable();
        value.set(2);
        component.disable();
        value.set(3);

        assert_eq!(*seen.borrow(), vec![(1, 1), (2, 1)]);
    }

    #[test]
    fn subscribe_registration_owns_returned_connection() {
        let component = Component::new();
        let signal = Signal::<()>::new();

        let source = signal.clone();
        component
            .event()
            .subscribe_registration(move || Some(source.connect(|_| {})));

        component.enable();
        assert_eq!(signal.connection_count(), 1);
        component.disable();
        assert_eq!(signal.connection_count(), 0);
    }
}
