/*! The plain sliding-window median engine (C4)

# About
Maintains the median of the last `W` elements of a stream that is known
never to carry missing values, in amortized `O(log W)` time per element. See
[`crate::movstat::nan_aware`] for the variant that tolerates NaN.

# Example
```rust
use movstat::MedianEngine;

let mut engine = MedianEngine::new(3, 3).unwrap();
let mut out = Vec::new();
for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
    out.push(engine.feed(v));
}
assert!(out[0].is_nan());
assert!(out[1].is_nan());
assert_eq!(&out[2..], &[2.0, 3.0, 4.0]);
```
*/

use super::error::{validate, MovStatError};
use super::heap::PairedHeap;
use super::pool::NodePool;
use super::MedianQuery;

/// An online sliding-window median over a stream with no missing values.
///
/// `insert_init` must be called for exactly the first `window()` values fed
/// to the engine, then `update` for every value after that; [`MedianEngine::feed`]
/// does this bookkeeping for you and is the usual way to drive the engine.
pub struct MedianEngine {
    window: usize,
    min_count: usize,
    heap: PairedHeap,
    pool: NodePool,
    filled: usize,
}

impl MedianEngine {
    /// Creates a new engine for a window of `window` elements, with at least
    /// `min_count` non-missing observations required before `median()`
    /// returns a number rather than NaN.
    ///
    /// The pool, both heap index arrays, and the handle are allocated once
    /// here and never resized; like the donor library's `malloc`-failure
    /// path, an allocation failure here aborts the process rather than
    /// returning an error -- safe Rust gives no other option for `Vec`
    /// allocation failure.
    pub fn new(window: usize, min_count: usize) -> Result<Self, MovStatError> {
        validate(window, min_count)?;
        Ok(MedianEngine {
            window,
            min_count,
            heap: PairedHeap::new(window),
            pool: NodePool::new(window),
            filled: 0,
        })
    }

    /// Returns to the empty, Filling state while retaining the pool and heap
    /// index arrays' allocations, for reuse across rows in a multi-row
    /// driver (see [`crate::movstat::driver::RowMajorDriver`]).
    pub fn reset(&mut self) {
        self.heap.reset();
        self.pool.reset();
        self.filled = 0;
    }

    /// True once the window holds `window()` elements and every further call
    /// must go through [`MedianEngine::update`] rather than `insert_init`.
    pub fn is_full(&self) -> bool {
        self.filled == self.window
    }

    /// Inserts one of the first `window()` values of a fresh stream.
    ///
    /// # Panics
    /// In debug builds, panics if the window is already full or if `v` is
    /// NaN (NaN is undefined behavior for this variant in release builds;
    /// use [`crate::movstat::nan_aware::NanAwareMedianEngine`] for streams
    /// that may carry missing values).
    pub fn insert_init(&mut self, v: f64) {
        debug_assert!(!self.is_full(), "insert_init called after the window filled");
        debug_assert!(!v.is_nan(), "NaN reached the plain median engine");

        let slot = self.filled;
        if slot == 0 {
            self.heap.append_leaf(&mut self.pool.nodes, slot, true);
            self.pool.admit_first(slot);
            self.pool.nodes[slot].val = v;
        } else {
            self.pool.admit_filling(slot);
            let small = self.heap.filling_destination_is_small();
            self.heap.append_leaf(&mut self.pool.nodes, slot, small);
            self.heap.update_node(&mut self.pool.nodes, slot, v);
        }
        self.filled += 1;
    }

    /// Slides the window by one: evicts the oldest value, admits `v`.
    ///
    /// # Panics
    /// In debug builds, panics if the window is not yet full or if `v` is
    /// NaN.
    pub fn update(&mut self, v: f64) {
        debug_assert!(self.is_full(), "update called before the window filled");
        debug_assert!(!v.is_nan(), "NaN reached the plain median engine");

        let victim = self.pool.rotate();
        self.heap.update_node(&mut self.pool.nodes, victim, v);
    }

    /// Feeds one value, driving `insert_init` or `update` as appropriate,
    /// and returns the median after admitting it.
    pub fn feed(&mut self, v: f64) -> f64 {
        if self.is_full() {
            self.update(v);
        } else {
            self.insert_init(v);
        }
        self.median()
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn check_invariants(&self) {
        self.heap.check_invariants(&self.pool.nodes);
        debug_assert!(self.heap.n_s() + self.heap.n_l() <= self.window);
    }
}

/// Renders the small/large heap contents and the FIFO ring pointers, in the
/// spirit of the donor's `mm_dump`.
impl std::fmt::Debug for MedianEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let small_vals: Vec<f64> = self.heap.s_heap.iter().map(|&i| self.pool.nodes[i].val).collect();
        let large_vals: Vec<f64> = self.heap.l_heap.iter().map(|&i| self.pool.nodes[i].val).collect();
        f.debug_struct("MedianEngine")
            .field("window", &self.window)
            .field("min_count", &self.min_count)
            .field("filled", &self.filled)
            .field("first", &self.pool.first)
            .field("last", &self.pool.last)
            .field("small_heap", &small_vals)
            .field("large_heap", &large_vals)
            .finish()
    }
}

impl MedianQuery for MedianEngine {
    fn median(&self) -> f64 {
        let n = self.heap.n_s() + self.heap.n_l();
        if n < self.min_count || n == 0 {
            return f64::NAN;
        }
        let effective = n.min(self.window);
        if effective % 2 == 1 {
            if self.heap.n_l() > self.heap.n_s() {
                self.pool.nodes[self.heap.l_root().unwrap()].val
            } else {
                self.pool.nodes[self.heap.s_root().unwrap()].val
            }
        } else {
            let s = self.pool.nodes[self.heap.s_root().unwrap()].val;
            let l = self.pool.nodes[self.heap.l_root().unwrap()].val;
            (s + l) / 2.0
        }
    }

    fn window(&self) -> usize {
        self.window
    }

    fn len(&self) -> usize {
        self.heap.n_s() + self.heap.n_l()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(engine: &mut MedianEngine, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&v| engine.feed(v)).collect()
    }

    fn naive_oracle(xs: &[f64], window: usize, min_count: usize) -> Vec<f64> {
        let mut out = Vec::with_capacity(xs.len());
        for i in 0..xs.len() {
            let start = i.saturating_sub(window - 1);
            let mut slice: Vec<f64> = xs[start..=i].to_vec();
            if slice.len() < min_count {
                out.push(f64::NAN);
                continue;
            }
            slice.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let n = slice.len();
            let m = if n % 2 == 1 {
                slice[n / 2]
            } else {
                (slice[n / 2 - 1] + slice[n / 2]) / 2.0
            };
            out.push(m);
        }
        out
    }

    fn assert_same(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            if x.is_nan() || y.is_nan() {
                assert!(x.is_nan() && y.is_nan());
            } else {
                assert!((x - y).abs() < 1e-9, "{x} != {y}");
            }
        }
    }

    #[test]
    fn scenario_1_w3_mincount3() {
        let mut e = MedianEngine::new(3, 3).unwrap();
        let out = feed_all(&mut e, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_same(&out[2..], &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn scenario_2_w4_mincount1() {
        let mut e = MedianEngine::new(4, 1).unwrap();
        let out = feed_all(&mut e, &[10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_same(&out, &[10.0, 15.0, 20.0, 25.0, 35.0]);
    }

    #[test]
    fn scenario_5_w2_mincount2() {
        let mut e = MedianEngine::new(2, 2).unwrap();
        let out = feed_all(&mut e, &[5.0, 5.0, 5.0, 5.0]);
        assert!(out[0].is_nan());
        assert_same(&out[1..], &[5.0, 5.0, 5.0]);
    }

    #[test]
    fn scenario_6_w4_mincount4() {
        let mut e = MedianEngine::new(4, 4).unwrap();
        let out = feed_all(&mut e, &[-1e9, 1e9, 0.0, 2.0, 3.0, 4.0]);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_same(&out[3..], &[1.0, 1.5, 2.5]);
    }

    #[test]
    fn reset_reproduces_same_sequence() {
        let xs = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let mut e = MedianEngine::new(3, 1).unwrap();
        let first = feed_all(&mut e, &xs);
        e.reset();
        let second = feed_all(&mut e, &xs);
        assert_eq!(first, second);
    }

    #[test]
    fn window_one_is_identity() {
        let mut e = MedianEngine::new(1, 1).unwrap();
        let out = feed_all(&mut e, &[7.0, 2.0, 9.0, -3.0, 0.0]);
        assert_same(&out, &[7.0, 2.0, 9.0, -3.0, 0.0]);
    }

    #[test]
    fn rejects_bad_construction_args() {
        assert!(MedianEngine::new(0, 0).is_err());
        assert!(MedianEngine::new(4, 5).is_err());
    }

    #[test]
    fn min_count_zero_does_not_panic_on_empty_window() {
        let e = MedianEngine::new(2, 0).unwrap();
        assert!(e.median().is_nan());
    }

    /// Randomized oracle comparison across a spread of window sizes. Not
    /// run under plain `cargo test` (`cargo test -- --ignored`): 5 * 10^5
    /// feeds is slow to repeat on every default test run.
    #[test]
    #[ignore]
    fn stress_matches_naive_oracle() {
        use rand::Rng;
        let mut rng = rand::rng();
        for &window in &[1usize, 2, 7, 64, 1024] {
            let min_count = 1.max(window / 3);
            let xs: Vec<f64> = (0..100_000).map(|_| rng.random_range(-1e6..1e6)).collect();
            let mut e = MedianEngine::new(window, min_count).unwrap();
            let got = feed_all(&mut e, &xs);
            let want = naive_oracle(&xs, window, min_count);
            assert_same(&got, &want);
            e.check_invariants();
        }
    }
}
