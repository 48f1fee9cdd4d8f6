//! # Event Surface
//!
//! The engine reports its progress through a small handler trait rather
//! than owning any output concern itself. Every method has a no-op default,
//! so a handler implements only what it consumes. Handlers run inline on
//! the engine's thread and receive non-owning views; nothing they are
//! handed may be retained past the call.

use std::ops::ControlFlow;

use crate::input::Sequence;
use crate::transform::TransformResult;

/// One completed decomposition level.
///
/// All offsets and lengths are in input symbols. The copy pattern is the
/// region `[cp_start, cp_start + cp_length)`; the collapsed region is
/// `joined_length = copy_factor * cp_length` symbols ending where the
/// pattern ends.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    /// Level number, starting at 1.
    pub level: u32,
    /// Copy factor of this level's pattern.
    pub copy_factor: u64,
    /// Input offset of the copy pattern.
    pub cp_start: usize,
    /// Length of one copy of the pattern.
    pub cp_length: usize,
    /// Total length collapsed at this level.
    pub joined_length: usize,
    /// Complexity accumulated through this level, in log2 units.
    pub complexity: f64,
}

/// Callbacks around and during a transform run.
pub trait TransformHandler {
    /// Called once after input materialisation, before the first level.
    fn init(&mut self, sequence: &Sequence) {
        let _ = sequence;
    }

    /// Called once per completed level, in strictly increasing level order.
    ///
    /// Returning [`ControlFlow::Break`] stops the run before the next
    /// level starts; results up to this level remain valid.
    fn step(&mut self, sequence: &Sequence, record: &StepRecord) -> ControlFlow<()> {
        let _ = (sequence, record);
        ControlFlow::Continue(())
    }

    /// Called with a monotonically non-decreasing completion ratio in
    /// `[0, 1]`. UI only; never affects results.
    fn progress(&mut self, ratio: f64) {
        let _ = ratio;
    }

    /// Called once after the last level, before the engine releases its
    /// working memory.
    fn finish(&mut self, sequence: &Sequence, result: &TransformResult) {
        let _ = (sequence, result);
    }
}

/// A handler that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHandler;

impl TransformHandler for NoHandler {}
