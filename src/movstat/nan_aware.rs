/*! The NaN-tolerant sliding-window median engine (C5)

# About
Identical heap mechanics to [`crate::movstat::plain`], but a NaN admitted
into the window is stored as a signed-infinity placeholder (`-INFINITY` on
the small side, `+INFINITY` on the large side) so the shared heap code in
[`crate::movstat::heap`] never has to know about missing values: infinities
sort correctly against any finite value and against each other.

Each side keeps its own doubly linked list of NaN placeholders (threaded
through [`crate::movstat::pool::Node::prev_nan`]/`next_nan`), oldest first,
so a NaN can be unlinked or moved to the other side in O(1) without a scan.
Whenever the count of real (non-NaN) values on the two sides drifts apart by
two -- which only a NaN eviction or insertion can cause, since an ordinary
value is always routed to keep the heaps within one of each other -- the
oldest NaN on the heavy side is flipped to the other side's sentinel sign and
re-settled, restoring the `nonnan` balance without touching any real value.

# Example
```rust
use movstat::NanAwareMedianEngine;

let mut engine = NanAwareMedianEngine::new(3, 1).unwrap();
let mut out = Vec::new();
for v in [1.0, f64::NAN, 3.0, 4.0, f64::NAN] {
    out.push(engine.feed(v));
}
assert_eq!(out[0], 1.0);
assert_eq!(out[2], 2.0);
```
*/

use super::error::{validate, MovStatError};
use super::heap::PairedHeap;
use super::pool::NodePool;
use super::MedianQuery;

/// An online sliding-window median over a stream that may contain NaN.
///
/// A NaN is treated as "missing": it never becomes the median and does not
/// count toward `min_count`, but it still occupies a slot in the window and
/// is evicted in FIFO order like any other value.
pub struct NanAwareMedianEngine {
    window: usize,
    min_count: usize,
    heap: PairedHeap,
    pool: NodePool,
    filled: usize,
    n_s_nan: usize,
    n_l_nan: usize,
    first_nan_s: Option<usize>,
    last_nan_s: Option<usize>,
    first_nan_l: Option<usize>,
    last_nan_l: Option<usize>,
}

impl NanAwareMedianEngine {
    /// See [`crate::movstat::plain::MedianEngine::new`].
    pub fn new(window: usize, min_count: usize) -> Result<Self, MovStatError> {
        validate(window, min_count)?;
        Ok(NanAwareMedianEngine {
            window,
            min_count,
            heap: PairedHeap::new(window),
            pool: NodePool::new(window),
            filled: 0,
            n_s_nan: 0,
            n_l_nan: 0,
            first_nan_s: None,
            last_nan_s: None,
            first_nan_l: None,
            last_nan_l: None,
        })
    }

    /// See [`crate::movstat::plain::MedianEngine::reset`].
    pub fn reset(&mut self) {
        self.heap.reset();
        self.pool.reset();
        self.filled = 0;
        self.n_s_nan = 0;
        self.n_l_nan = 0;
        self.first_nan_s = None;
        self.last_nan_s = None;
        self.first_nan_l = None;
        self.last_nan_l = None;
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.window
    }

    fn nonnan_n_s(&self) -> usize {
        self.heap.n_s() - self.n_s_nan
    }

    fn nonnan_n_l(&self) -> usize {
        self.heap.n_l() - self.n_l_nan
    }

    /// Where a real value lands while the window is still filling: a
    /// NaN-aware variant of [`PairedHeap::filling_destination_is_small`]
    /// that balances on non-NaN counts rather than raw occupancy, so a run
    /// of leading NaNs doesn't skew which heap receives the next real value.
    fn real_destination_is_small(&self) -> bool {
        !(self.heap.n_s() == self.heap.max_s || self.nonnan_n_s() > self.nonnan_n_l())
    }

    /// Where a NaN lands while the window is still filling: prefers
    /// whichever side is not already full, tie-breaking toward the large
    /// heap when the small side already holds more NaNs than the large
    /// side, to keep NaNs themselves from skewing the real-value balance.
    fn nan_destination_is_small(&self) -> bool {
        let l_capacity = self.window - self.heap.max_s;
        let l_full = self.heap.n_l() == l_capacity;
        let s_full = self.heap.n_s() == self.heap.max_s;
        !((s_full || self.n_s_nan > self.n_l_nan) && !l_full)
    }

    /// Inserts one of the first `window()` values of a fresh stream.
    ///
    /// # Panics
    /// In debug builds, panics if the window is already full.
    pub fn insert_init(&mut self, v: f64) {
        debug_assert!(!self.is_full(), "insert_init called after the window filled");

        let slot = self.filled;
        if slot == 0 {
            self.heap.append_leaf(&mut self.pool.nodes, slot, true);
            self.pool.admit_first(slot);
            if v.is_nan() {
                self.n_s_nan = 1;
                self.first_nan_s = Some(slot);
                self.last_nan_s = Some(slot);
                self.pool.nodes[slot].val = f64::NEG_INFINITY;
            } else {
                self.pool.nodes[slot].val = v;
            }
        } else if v.is_nan() {
            self.insert_nan_filling(slot);
        } else {
            self.pool.admit_filling(slot);
            let small = self.real_destination_is_small();
            self.heap.append_leaf(&mut self.pool.nodes, slot, small);
            self.heap.update_node(&mut self.pool.nodes, slot, v);
        }
        self.filled += 1;
    }

    fn insert_nan_filling(&mut self, slot: usize) {
        self.pool.admit_filling(slot);
        let small = self.nan_destination_is_small();
        self.heap.append_leaf(&mut self.pool.nodes, slot, small);
        self.pool.nodes[slot].next_nan = None;
        let val = if small {
            self.n_s_nan += 1;
            self.append_nan_s(slot);
            f64::NEG_INFINITY
        } else {
            self.n_l_nan += 1;
            self.append_nan_l(slot);
            f64::INFINITY
        };
        self.heap.update_node(&mut self.pool.nodes, slot, val);
    }

    fn append_nan_s(&mut self, node: usize) {
        match self.last_nan_s {
            None => {
                self.pool.nodes[node].prev_nan = None;
                self.first_nan_s = Some(node);
            }
            Some(last) => {
                self.pool.nodes[last].next_nan = Some(node);
                self.pool.nodes[node].prev_nan = Some(last);
            }
        }
        self.last_nan_s = Some(node);
    }

    fn append_nan_l(&mut self, node: usize) {
        match self.last_nan_l {
            None => {
                self.pool.nodes[node].prev_nan = None;
                self.first_nan_l = Some(node);
            }
            Some(last) => {
                self.pool.nodes[last].next_nan = Some(node);
                self.pool.nodes[node].prev_nan = Some(last);
            }
        }
        self.last_nan_l = Some(node);
    }

    fn unlink_nan_s(&mut self, node: usize) {
        if self.first_nan_s == Some(node) {
            let next = self.pool.nodes[node].next_nan;
            self.first_nan_s = next;
            match next {
                Some(n) => self.pool.nodes[n].prev_nan = None,
                None => self.last_nan_s = None,
            }
        } else {
            let prev = self.pool.nodes[node]
                .prev_nan
                .expect("non-head NaN node missing prev_nan link");
            let next = self.pool.nodes[node].next_nan;
            self.pool.nodes[prev].next_nan = next;
            match next {
                Some(n) => self.pool.nodes[n].prev_nan = Some(prev),
                None => self.last_nan_s = Some(prev),
            }
            self.pool.nodes[node].next_nan = None;
        }
    }

    fn unlink_nan_l(&mut self, node: usize) {
        if self.first_nan_l == Some(node) {
            let next = self.pool.nodes[node].next_nan;
            self.first_nan_l = next;
            match next {
                Some(n) => self.pool.nodes[n].prev_nan = None,
                None => self.last_nan_l = None,
            }
        } else {
            let prev = self.pool.nodes[node]
                .prev_nan
                .expect("non-head NaN node missing prev_nan link");
            let next = self.pool.nodes[node].next_nan;
            self.pool.nodes[prev].next_nan = next;
            match next {
                Some(n) => self.pool.nodes[n].prev_nan = Some(prev),
                None => self.last_nan_l = Some(prev),
            }
            self.pool.nodes[node].next_nan = None;
        }
    }

    /// Evicts the oldest slot (unlinking it from a NaN list first if it held
    /// one), then admits `val` into that same slot and registers it as a new
    /// NaN placeholder if it is infinite.
    fn update_withnan(&mut self, val: f64) {
        let victim = self.pool.first;
        let victim_val = self.pool.nodes[victim].val;
        if victim_val.is_infinite() {
            if self.pool.nodes[victim].small {
                self.n_s_nan -= 1;
                self.unlink_nan_s(victim);
            } else {
                self.n_l_nan -= 1;
                self.unlink_nan_l(victim);
            }
        }

        if val.is_infinite() {
            self.pool.nodes[victim].next_nan = None;
            if val > 0.0 {
                self.n_l_nan += 1;
                self.append_nan_l(victim);
            } else {
                self.n_s_nan += 1;
                self.append_nan_s(victim);
            }
        }

        let slot = self.pool.rotate();
        debug_assert_eq!(slot, victim);
        self.heap.update_node(&mut self.pool.nodes, slot, val);
    }

    /// Flips the oldest NaN on the heavier non-NaN side to the other side's
    /// sentinel sign, restoring the non-NaN balance after a NaN admission or
    /// eviction pushed the two sides more than one apart.
    fn rebalance_nan(&mut self) {
        if self.nonnan_n_l() == self.nonnan_n_s() + 2 {
            self.move_nan_from_s_to_l();
        } else if self.nonnan_n_s() == self.nonnan_n_l() + 2 {
            self.move_nan_from_l_to_s();
        }
    }

    fn move_nan_from_s_to_l(&mut self) {
        let node = self
            .first_nan_s
            .expect("rebalance requires a small-side NaN to move");
        self.first_nan_s = self.pool.nodes[node].next_nan;
        match self.first_nan_s {
            Some(n) => self.pool.nodes[n].prev_nan = None,
            None => self.last_nan_s = None,
        }
        self.pool.nodes[node].next_nan = None;
        self.append_nan_l(node);
        self.n_s_nan -= 1;
        self.n_l_nan += 1;
        self.heap.update_node(&mut self.pool.nodes, node, f64::INFINITY);
    }

    fn move_nan_from_l_to_s(&mut self) {
        let node = self
            .first_nan_l
            .expect("rebalance requires a large-side NaN to move");
        self.first_nan_l = self.pool.nodes[node].next_nan;
        match self.first_nan_l {
            Some(n) => self.pool.nodes[n].prev_nan = None,
            None => self.last_nan_l = None,
        }
        self.pool.nodes[node].next_nan = None;
        self.append_nan_s(node);
        self.n_l_nan -= 1;
        self.n_s_nan += 1;
        self.heap.update_node(&mut self.pool.nodes, node, f64::NEG_INFINITY);
    }

    /// Slides the window by one, admitting `val`, which the caller already
    /// knows is not NaN (though the slot it evicts may have held one).
    ///
    /// This is the fast path for streams where NaN is rare enough that the
    /// caller filters it out before calling, falling back to
    /// [`NanAwareMedianEngine::update_checknan`] only when `val` might be
    /// NaN. If every value in the stream is known never to be NaN, prefer
    /// [`crate::movstat::plain::MedianEngine`] instead, which carries no NaN
    /// bookkeeping at all.
    ///
    /// # Panics
    /// In debug builds, panics if the window is not yet full or if `val` is
    /// NaN.
    pub fn update(&mut self, val: f64) {
        debug_assert!(self.is_full(), "update called before the window filled");
        debug_assert!(!val.is_nan(), "update called with NaN, use update_checknan");
        self.update_withnan(val);
        self.rebalance_nan();
    }

    /// Slides the window by one, admitting `val`, which may be NaN.
    ///
    /// When `val` is NaN, the side it nominally joins is chosen to keep the
    /// non-NaN counts on both sides as close as possible, biased by whether
    /// the value about to be evicted was itself a NaN -- the same
    /// rebalancing-avoidance trick the donor implementation uses to keep
    /// high-NaN-rate streams from paying the O(log W) rebalance on every
    /// single slide.
    ///
    /// # Panics
    /// In debug builds, panics if the window is not yet full.
    pub fn update_checknan(&mut self, val: f64) {
        debug_assert!(self.is_full(), "update_checknan called before the window filled");

        if val.is_nan() {
            let victim = self.pool.first;
            let victim_val = self.pool.nodes[victim].val;
            let mut evict_effect_s = 0;
            let mut evict_effect_l = 0;
            if victim_val.is_infinite() {
                if self.pool.nodes[victim].small {
                    evict_effect_s = 1;
                } else {
                    evict_effect_l = 1;
                }
            }
            let chosen = if self.nonnan_n_s() + evict_effect_s > self.nonnan_n_l() + evict_effect_l
            {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            };
            self.update_withnan(chosen);
        } else {
            self.update_withnan(val);
        }

        self.rebalance_nan();
    }

    /// Feeds one value, driving `insert_init` or `update_checknan` as
    /// appropriate, and returns the median after admitting it.
    pub fn feed(&mut self, v: f64) -> f64 {
        if self.is_full() {
            self.update_checknan(v);
        } else {
            self.insert_init(v);
        }
        self.median()
    }

    /// Checks P1-P7: the shared heap invariants plus NaN-list consistency
    /// (list-head/tail symmetry, no length beyond the owning heap's size,
    /// every listed node actually sentinel-valued).
    #[cfg(any(test, debug_assertions))]
    pub(crate) fn check_invariants(&self) {
        self.heap.check_invariants(&self.pool.nodes);
        debug_assert!(self.n_s_nan <= self.heap.n_s(), "P5: small NaN count");
        debug_assert!(self.n_l_nan <= self.heap.n_l(), "P5: large NaN count");

        let mut len = 0;
        let mut iter = self.first_nan_s;
        let mut prev = None;
        while let Some(node) = iter {
            debug_assert!(self.pool.nodes[node].val.is_infinite(), "P7: NaN list node not infinite");
            debug_assert_eq!(self.pool.nodes[node].prev_nan, prev, "P6: small NaN prev link");
            len += 1;
            debug_assert!(len <= self.heap.n_s(), "P6: small NaN list longer than heap");
            prev = Some(node);
            iter = self.pool.nodes[node].next_nan;
        }
        debug_assert_eq!(len, self.n_s_nan, "P5: small NaN count mismatches list length");
        debug_assert_eq!(self.last_nan_s, prev, "P6: small NaN tail pointer");

        let mut len = 0;
        let mut iter = self.first_nan_l;
        let mut prev = None;
        while let Some(node) = iter {
            debug_assert!(self.pool.nodes[node].val.is_infinite(), "P7: NaN list node not infinite");
            debug_assert_eq!(self.pool.nodes[node].prev_nan, prev, "P6: large NaN prev link");
            len += 1;
            debug_assert!(len <= self.heap.n_l(), "P6: large NaN list longer than heap");
            prev = Some(node);
            iter = self.pool.nodes[node].next_nan;
        }
        debug_assert_eq!(len, self.n_l_nan, "P5: large NaN count mismatches list length");
        debug_assert_eq!(self.last_nan_l, prev, "P6: large NaN tail pointer");

        debug_assert!(self.nonnan_n_s().abs_diff(self.nonnan_n_l()) <= 1, "P5: non-NaN balance");
    }
}

/// Renders the small/large heap contents, the FIFO ring pointers, and both
/// NaN-list lengths, in the spirit of the donor's `zz_dump`.
impl std::fmt::Debug for NanAwareMedianEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let small_vals: Vec<f64> = self.heap.s_heap.iter().map(|&i| self.pool.nodes[i].val).collect();
        let large_vals: Vec<f64> = self.heap.l_heap.iter().map(|&i| self.pool.nodes[i].val).collect();
        f.debug_struct("NanAwareMedianEngine")
            .field("window", &self.window)
            .field("min_count", &self.min_count)
            .field("filled", &self.filled)
            .field("first", &self.pool.first)
            .field("last", &self.pool.last)
            .field("small_heap", &small_vals)
            .field("large_heap", &large_vals)
            .field("n_s_nan", &self.n_s_nan)
            .field("n_l_nan", &self.n_l_nan)
            .finish()
    }
}

impl MedianQuery for NanAwareMedianEngine {
    fn median(&self) -> f64 {
        let total = self.nonnan_n_s() + self.nonnan_n_l();
        if total < self.min_count || total == 0 {
            return f64::NAN;
        }
        let effective = total.min(self.window);
        if effective % 2 == 1 {
            if self.nonnan_n_l() > self.nonnan_n_s() {
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
        self.nonnan_n_s() + self.nonnan_n_l()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
