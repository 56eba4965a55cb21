//! Snapshot consumers.
//!
//! RULE: Observers only read snapshots. Whatever they do with one
//! (draw it, write it out, count it) is invisible to the engine,
//! except for the continue/stop signal they hand back.

use crate::{error::SimResult, snapshot::SimSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverSignal {
    Continue,
    Stop,
}

pub trait SnapshotObserver<S> {
    fn observe(&mut self, snapshot: &SimSnapshot<S>) -> SimResult<ObserverSignal>;

    /// Asked before every step. Returning false stops the run without
    /// stepping, so no draws are spent on a frame nobody will see.
    fn wants_more(&self) -> bool {
        true
    }
}

impl<S, F> SnapshotObserver<S> for F
where
    F: FnMut(&SimSnapshot<S>) -> ObserverSignal,
{
    fn observe(&mut self, snapshot: &SimSnapshot<S>) -> SimResult<ObserverSignal> {
        Ok(self(snapshot))
    }
}

/// Caps how many frames an inner observer receives, then asks the
/// engine to stop. Mirrors a batch recorder with a fixed frame count.
pub struct FrameBudget<O> {
    inner:     O,
    remaining: u64,
}

impl<O> FrameBudget<O> {
    pub fn new(inner: O, frames: u64) -> Self {
        Self { inner, remaining: frames }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<S, O: SnapshotObserver<S>> SnapshotObserver<S> for FrameBudget<O> {
    fn observe(&mut self, snapshot: &SimSnapshot<S>) -> SimResult<ObserverSignal> {
        if self.remaining == 0 {
            return Ok(ObserverSignal::Stop);
        }
        self.remaining -= 1;
        let signal = self.inner.observe(snapshot)?;
        if self.remaining == 0 {
            log::info!("frame budget exhausted at tick {}", snapshot.tick);
            return Ok(ObserverSignal::Stop);
        }
        Ok(signal)
    }

    fn wants_more(&self) -> bool {
        self.remaining > 0 && self.inner.wants_more()
    }
}
