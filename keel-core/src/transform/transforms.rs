//! Entry points for building transforms.
//!
//! ```rust
//! use keel_core::transform::transforms;
//!
//! let intro = transforms::sequence([
//!     transforms::func(|| println!("one")),
//!     transforms::create().wait(0.5),
//!     transforms::func(|| println!("two")),
//! ]);
//! assert_eq!(intro.len(), 1);
//! ```

use super::builder::TransformBuilder;
use super::primitives::Func;
use super::sequence::{ParallelTransformSequence, TransformSequence};
use super::IntoTransform;

/// An empty builder.
pub fn create() -> TransformBuilder {
    TransformBuilder::new()
}

/// A builder whose single step runs every given builder side by side.
pub fn parallel<I>(builders: I) -> TransformBuilder
where
    I: IntoIterator<Item = TransformBuilder>,
{
    create().push(ParallelTransformSequence::new(
        builders.into_iter().map(IntoTransform::into_transform),
    ))
}

/// A builder whose single step runs every given builder one after another.
pub fn sequence<I>(builders: I) -> TransformBuilder
where
    I: IntoIterator<Item = TransformBuilder>,
{
    create().push(TransformSequence::new(
        builders.into_iter().map(IntoTransform::into_transform),
    ))
}

/// A builder that runs `func` once.
pub fn func<F>(func: F) -> TransformBuilder
where
    F: FnOnce() + 'static,
{
    create().push(Func::new(func))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::transform::{Frame, Transform};

    fn logger(log: &Rc<RefCell<Vec<u32>>>, value: u32) -> TransformBuilder {
        let log = log.clone();
        func(move || log.borrow_mut().push(value))
    }

    #[test]
    fn sequence_runs_one_builder_per_step() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut built = sequence([logger(&log, 1), logger(&log, 2)]).build_sequence();

        assert!(matches!(built.run_frame(0.0), Frame::Continue));
        assert_eq!(*log.borrow(), vec![1]);
        assert!(matches!(built.run_frame(0.1), Frame::Done));
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn parallel_runs_every_builder_in_one_frame() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut built = parallel([logger(&log, 1), logger(&log, 2)]).build_sequence();

        assert!(matches!(built.run_frame(0.0), Frame::Done));
        assert_eq!(*log.borrow(), vec![1, 2]);
    }
}
