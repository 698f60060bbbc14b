//! Sequential and parallel composition.

use std::collections::VecDeque;
use std::fmt;

use super::{Frame, Transform};

/// Runs steps one after another.
///
/// Each step sees its own local clock, starting at zero. When a step
/// completes the clock is reset and the next step starts on the following
/// tick. A continuation returned by a step replaces it and starts at once,
/// in the same tick.
pub struct TransformSequence {
    steps: VecDeque<Box<dyn Transform>>,
    time_offset: f64,
}

impl TransformSequence {
    pub fn new<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Transform>>,
    {
        Self {
            steps: steps.into_iter().collect(),
            time_offset: 0.0,
        }
    }

    /// Shift the local clock so that `time` is this sequence's zero.
    pub fn starting_at(mut self, time: f64) -> Self {
        self.time_offset = time;
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Transform for TransformSequence {
    fn run_frame(&mut self, time: f64) -> Frame {
        loop {
            let Some(step) = self.steps.front_mut() else {
                return Frame::Done;
            };

            match step.run_frame(time - self.time_offset) {
                Frame::Continue => return Frame::Continue,
                Frame::Done => {
                    self.steps.pop_front();
                    self.time_offset = time;

                    return if self.steps.is_empty() {
                        Frame::Done
                    } else {
                        Frame::Continue
                    };
                }
                Frame::Replace(continuation) => {
                    self.steps.pop_front();
                    self.steps
                        .push_front(Box::new(continuation.build_sequence()));
                    self.time_offset = time;
                }
            }
        }
    }

    fn finish(&mut self) {
        for mut step in self.steps.drain(..) {
            step.finish();
        }
    }
}

impl fmt::Debug for TransformSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformSequence")
            .field("steps", &self.steps.len())
            .field("time_offset", &self.time_offset)
            .finish()
    }
}

/// Runs steps side by side on a shared clock.
///
/// Steps are advanced in registration order. Completed steps leave the
/// group; a continuation replaces its step in place and runs its first frame
/// right away, on the same shared clock as its siblings.
pub struct ParallelTransformSequence {
    steps: Vec<Box<dyn Transform>>,
}

impl ParallelTransformSequence {
    pub fn new<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Transform>>,
    {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Transform for ParallelTransformSequence {
    fn run_frame(&mut self, time: f64) -> Frame {
        let mut index = 0;
        while index < self.steps.len() {
            match self.steps[index].run_frame(time) {
                Frame::Continue => index += 1,
                Frame::Done => {
                    self.steps.remove(index);
                }
                Frame::Replace(continuation) => {
                    self.steps[index] = Box::new(continuation.build_sequence());
                }
            }
        }

        if self.steps.is_empty() {
            Frame::Done
        } else {
            Frame::Continue
        }
    }

    fn finish(&mut self) {
        for mut step in self.steps.drain(..) {
            step.finish();
        }
    }
}

impl fmt::Debug for ParallelTransformSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelTransformSequence")
            .field("steps", &self.steps.len())
            .finish()
    }
}
