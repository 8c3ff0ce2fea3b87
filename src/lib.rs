/*! # About
A streaming median over a sliding window, the kind you'd reach for to
de-spike a noisy sensor feed or a rolling-window statistic over a time
series, without re-sorting the window on every new value.

The core trick is a pair of heaps -- a max-heap for the lower half of the
window and a min-heap for the upper half -- kept the same size (or within
one of each other), so the median is always one or two heap roots away.
Sliding the window evicts exactly one value and admits exactly one value,
both in `O(log W)`, instead of the `O(W log W)` a naive re-sort would cost
per slide. Both heaps branch 8-ways rather than 2, which keeps the tree
shallow and favorable for a CPU cache at the window sizes this is meant for.

# Engines

- [`movstat::MedianEngine`](crate::movstat::plain::MedianEngine): the plain
  engine, for a stream that never contains NaN. Fastest of the two; NaN
  reaching it is undefined behavior (checked by `debug_assert` only).

- [`movstat::NanAwareMedianEngine`](crate::movstat::nan_aware::NanAwareMedianEngine):
  tolerates NaN as a missing value that still occupies a window slot and is
  evicted in FIFO order, but never becomes the median and doesn't count
  toward `min_count`.

Both share the same heap mechanics and the same pre-allocated node pool;
see [`movstat::heap`](crate::movstat::heap) and
[`movstat::pool`](crate::movstat::pool) if you're curious how the coupling
between the two heaps, or the FIFO eviction ring, actually works.

# Driving a stream

[`movstat::driver`](crate::movstat::driver) has [`StreamDriver`] for a
single stream where the plain/NaN-aware choice is made once at
construction, and [`RowMajorDriver`] for many independent streams (rows of
a matrix) sharing one window size, optionally spread across a `rayon`
thread pool behind the `parallel` feature.

# Example
```rust
use movstat::{MedianEngine, MedianQuery};

let mut engine = MedianEngine::new(3, 3).unwrap();
let medians: Vec<f64> = [1.0, 2.0, 3.0, 4.0, 5.0]
    .into_iter()
    .map(|v| engine.feed(v))
    .collect();
assert_eq!(&medians[2..], &[2.0, 3.0, 4.0]);
assert_eq!(engine.window(), 3);
```
*/

pub mod movstat;

pub use movstat::driver::{IntMedianDriver, RowMajorDriver, StreamDriver};
pub use movstat::{MedianEngine, MedianQuery, MovStatError, NanAwareMedianEngine};
