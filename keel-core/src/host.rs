//! The host's frame clock.

use crate::event::Signal;

/// Per-frame tick source.
///
/// The host calls [`tick`](Self::tick) once per rendered frame with the
/// seconds elapsed since the previous one. Every
/// [`TransformRunner`](crate::transform::TransformRunner) created from this
/// heartbeat advances on that call.
#[derive(Debug, Clone, Default)]
pub struct Heartbeat {
    signal: Signal<f64>,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance every subscriber by `dt` seconds.
    pub fn tick(&self, dt: f64) {
        self.signal.fire(&dt);
    }

    /// The signal fired on every tick with the frame's `dt`.
    pub fn signal(&self) -> &Signal<f64> {
        &self.signal
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn tick_reaches_subscribers() {
        let heartbeat = Heartbeat::new();
        let total = Rc::new(Cell::new(0.0));
        let total_clone = total.clone();
        let _connection = heartbeat
            .signal()
            .connect(move |dt| total_clone.set(total_clone.get() + dt));

        heartbeat.tick(0.25);
        heartbeat.tick(0.5);
        assert_eq!(total.get(), 0.75);
    }
}
