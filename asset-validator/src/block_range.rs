//! Adaptive block-range cursor (C1).
//!
//! Replaces the generator-based range walker from the original tooling
//! with an explicit state struct: `cursor`, `pending rollback`, and a
//! mutable step. No generator/coroutine machinery is needed because
//! `set_step`/`rollback` only ever act between two `next()` calls.

/// A closed, inclusive block interval `[lo, hi]` with `lo <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInterval {
    /// Inclusive lower bound.
    pub lo: u64,
    /// Inclusive upper bound.
    pub hi: u64,
}

impl BlockInterval {
    /// Number of blocks covered by this interval.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.hi - self.lo + 1
    }

    /// An interval never has zero length (`lo <= hi` is an invariant).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Lazily emits non-overlapping [`BlockInterval`]s covering `[from, to]`,
/// forward or reverse, with a batch size (`step`) mutable between
/// emissions and support for re-emitting the last interval.
#[derive(Debug)]
pub struct AdaptiveBlockRange {
    from: u64,
    to: u64,
    reverse: bool,
    step: u64,
    /// Forward: next `lo` to emit. Reverse: next `hi` to emit.
    cursor: u64,
    prev_cursor: Option<u64>,
    rollback_pending: bool,
    finished: bool,
    /// Reverse mode with `from == 0` emits one extra `(1, 1)` interval
    /// once the normal walk would otherwise stop at the zero boundary;
    /// this flag arms that degenerate final emission. Preserved
    /// verbatim from the original range walker (see DESIGN.md).
    zero_from_degenerate_pending: bool,
}

impl AdaptiveBlockRange {
    /// Build a range walker covering `[from, to]` with an initial batch
    /// size of `step` (clamped to at least 1).
    #[must_use]
    pub fn new(from: u64, to: u64, step: u64, reverse: bool) -> Self {
        let step = step.max(1);
        let cursor = if reverse { to } else { from };
        Self {
            from,
            to,
            reverse,
            step,
            cursor,
            prev_cursor: None,
            rollback_pending: false,
            finished: false,
            zero_from_degenerate_pending: reverse && from == 0,
        }
    }

    /// Batch size used to compute the next interval.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Upper bound of the range being walked, for progress reporting.
    #[must_use]
    pub const fn to(&self) -> u64 {
        self.to
    }

    /// Emit the next interval, or `None` once the range is exhausted.
    pub fn next(&mut self) -> Option<BlockInterval> {
        if self.finished {
            return None;
        }

        if self.rollback_pending {
            if let Some(cursor) = self.prev_cursor.take() {
                self.cursor = cursor;
            }
            self.rollback_pending = false;
        }

        if self.reverse {
            self.next_reverse()
        } else {
            self.next_forward()
        }
    }

    fn next_forward(&mut self) -> Option<BlockInterval> {
        let lo = self.cursor;
        if lo > self.to {
            self.finished = true;
            return None;
        }

        let hi = (lo + self.step - 1).min(self.to);
        self.prev_cursor = Some(lo);
        self.cursor = hi + 1;
        Some(BlockInterval { lo, hi })
    }

    fn next_reverse(&mut self) -> Option<BlockInterval> {
        let effective_from = self.from.max(1);
        let hi = self.cursor;

        if hi < effective_from {
            if self.zero_from_degenerate_pending {
                self.zero_from_degenerate_pending = false;
                self.finished = true;
                self.prev_cursor = Some(hi);
                return Some(BlockInterval { lo: 1, hi: 1 });
            }
            self.finished = true;
            return None;
        }

        let lo = hi.saturating_sub(self.step - 1).max(effective_from);
        self.prev_cursor = Some(hi);
        self.cursor = lo.saturating_sub(1);
        Some(BlockInterval { lo, hi })
    }

    /// Change the batch size. Takes effect on the next emission; a
    /// no-op if `n` equals the current step.
    pub fn set_step(&mut self, n: u64) {
        let n = n.max(1);
        if n != self.step {
            self.step = n;
        }
    }

    /// Arrange for the next `next()` call to recompute the interval
    /// starting from where the last one started, using the current
    /// step. Only one rollback may be pending at a time; a repeated
    /// call while one is already pending is a no-op.
    pub fn rollback(&mut self) {
        if self.prev_cursor.is_some() {
            self.rollback_pending = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(mut range: AdaptiveBlockRange) -> Vec<(u64, u64)> {
        let mut out = Vec::new();
        while let Some(interval) = range.next() {
            out.push((interval.lo, interval.hi));
        }
        out
    }

    #[test]
    fn forward_step_50_splits_evenly_with_final_clip() {
        let range = AdaptiveBlockRange::new(0, 100, 50, false);
        assert_eq!(collect(range), vec![(0, 49), (50, 99), (100, 100)]);
    }

    #[test]
    fn forward_step_60_leaves_uneven_final_interval() {
        let range = AdaptiveBlockRange::new(0, 100, 60, false);
        assert_eq!(collect(range), vec![(0, 59), (60, 100)]);
    }

    #[test]
    fn reverse_step_50_emits_descending_with_degenerate_tail() {
        let range = AdaptiveBlockRange::new(0, 100, 50, true);
        assert_eq!(collect(range), vec![(51, 100), (1, 50), (1, 1)]);
    }

    #[test]
    fn reverse_from_nonzero_has_no_degenerate_tail() {
        let range = AdaptiveBlockRange::new(1, 100, 50, true);
        assert_eq!(collect(range), vec![(51, 100), (1, 50)]);
    }

    #[test]
    fn set_step_takes_effect_on_next_emission() {
        let mut range = AdaptiveBlockRange::new(0, 100, 50, false);
        assert_eq!(range.next(), Some(BlockInterval { lo: 0, hi: 49 }));
        range.set_step(10);
        assert_eq!(range.next(), Some(BlockInterval { lo: 50, hi: 59 }));
        assert_eq!(range.next(), Some(BlockInterval { lo: 60, hi: 69 }));
    }

    #[test]
    fn rollback_then_set_step_recomputes_from_the_rolled_back_start() {
        let mut range = AdaptiveBlockRange::new(0, 100, 50, false);
        assert_eq!(range.next(), Some(BlockInterval { lo: 0, hi: 49 }));
        range.set_step(10);
        assert_eq!(range.next(), Some(BlockInterval { lo: 50, hi: 59 }));
        range.set_step(20);
        range.rollback();
        assert_eq!(range.next(), Some(BlockInterval { lo: 50, hi: 69 }));
    }

    #[test]
    fn from_equals_to_yields_one_single_block_interval() {
        let range = AdaptiveBlockRange::new(42, 42, 50, false);
        assert_eq!(collect(range), vec![(42, 42)]);
    }

    #[test]
    fn set_step_with_same_value_is_a_no_op() {
        let mut range = AdaptiveBlockRange::new(0, 100, 50, false);
        range.set_step(50);
        assert_eq!(range.step(), 50);
    }
}
