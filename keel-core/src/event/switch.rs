//! Observable switch: a boolean assembled from many keyed votes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;

use super::observable::ReadonlyObservable;
use super::signal::Signal;
use crate::key::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    And,
    Or,
}

struct SwitchInner {
    mode: Mode,
    default_value: bool,
    trues: RefCell<IndexSet<Key>>,
    falses: RefCell<IndexSet<Key>>,
    changed: Signal<(bool, bool)>,
}

/// A boolean derived from keyed true/false assertions.
///
/// Every caller owns one key and can flip only its own vote. In AND mode the
/// switch is on when nobody votes false; in OR mode it is on when anybody
/// votes true. With no votes at all it reports its default.
#[derive(Clone)]
pub struct ObservableSwitch {
    inner: Rc<SwitchInner>,
}

impl ObservableSwitch {
    fn with_mode(mode: Mode, default_value: bool) -> Self {
        Self {
            inner: Rc::new(SwitchInner {
                mode,
                default_value,
                trues: RefCell::new(IndexSet::new()),
                falses: RefCell::new(IndexSet::new()),
                changed: Signal::new(),
            }),
        }
    }

    /// A switch that is on only while no key asserts false.
    pub fn and(default_value: bool) -> Self {
        Self::with_mode(Mode::And, default_value)
    }

    /// A switch that is on while any key asserts true.
    pub fn or(default_value: bool) -> Self {
        Self::with_mode(Mode::Or, default_value)
    }

    /// The combined value.
    pub fn get(&self) -> bool {
        let trues = self.inner.trues.borrow().len();
        let falses = self.inner.falses.borrow().len();
        if trues == 0 && falses == 0 {
            return self.inner.default_value;
        }

        match self.inner.mode {
            Mode::And => falses == 0,
            Mode::Or => trues != 0,
        }
    }

    /// The vote of a single key, or the default if it never voted.
    pub fn get_keyed(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        if self.inner.trues.borrow().contains(&key) {
            return true;
        }
        if self.inner.falses.borrow().contains(&key) {
            return false;
        }
        self.inner.default_value
    }

    /// Record the vote of `key`.
    pub fn set(&self, key: impl Into<Key>, enabled: bool) {
        let key = key.into();
        self.mutate(|trues, falses| {
            if enabled {
                falses.shift_remove(&key);
                trues.insert(key);
            } else {
                trues.shift_remove(&key);
                falses.insert(key);
            }
        });
    }

    /// Withdraw the vote of `key`.
    pub fn remove(&self, key: impl Into<Key>) {
        let key = key.into();
        self.mutate(|trues, falses| {
            trues.shift_remove(&key);
            falses.shift_remove(&key);
        });
    }

    fn mutate<F>(&self, func: F)
    where
        F: FnOnce(&mut IndexSet<Key>, &mut IndexSet<Key>),
    {
        let prev = self.get();
        func(
            &mut *self.inner.trues.borrow_mut(),
            &mut *self.inner.falses.borrow_mut(),
        );

        let value = self.get();
        if value != prev {
            self.inner.changed.fire(&(value, prev));
        }
    }

    /// The change signal.
    pub fn changed(&self) -> &Signal<(bool, bool)> {
        &self.inner.changed
    }
}

impl ReadonlyObservable<bool> for ObservableSwitch {
    fn get(&self) -> bool {
        ObservableSwitch::get(self)
    }

    fn changed(&self) -> Signal<(bool, bool)> {
        self.inner.changed.clone()
    }
}

impl fmt::Debug for ObservableSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableSwitch")
            .field("mode", &self.inner.mode)
            .field("value", &self.get())
            .field("trues", &*self.inner.trues.borrow())
            .field("falses", &*self.inner.falses.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn and_switch_requires_every_vote() {
        let switch = ObservableSwitch::and(true);
        assert!(switch.get());

        switch.set("loading", false);
        switch.set("enabled", true);
        assert!(!switch.get());

        switch.set("loading", true);
        assert!(switch.get());
    }

    #[test]
    fn or_switch_needs_one_vote() {
        let switch = ObservableSwitch::or(false);
        assert!(!switch.get());

        switch.set("hover", false);
        assert!(!switch.get());
        switch.set("focus", true);
        assert!(switch.get());
    }

    #[test]
    fn empty_switch_reports_default() {
        let switch = ObservableSwitch::and(false);
        switch.set("a", true);
        assert!(switch.get());

        switch.remove("a");
        assert!(!switch.get());
    }

    #[test]
    fn keyed_lookup() {
        let switch = ObservableSwitch::and(true);
        switch.set("a", false);

        assert!(!switch.get_keyed("a"));
        assert!(switch.get_keyed("missing"));
    }

    #[test]
    fn changed_fires_only_on_flips() {
        let switch = ObservableSwitch::and(true);
        let calls = Rc::new(Cell::new(0));

        let calls_clone = calls.clone();
        switch.subscribe(move |_, _| calls_clone.set(calls_clone.get() + 1));

        switch.set("a", true);
        switch.set("b", false);
        switch.set("c", false);
        switch.set("b", true);
        switch.set("c", true);

        assert_eq!(calls.get(), 2);
    }
}
