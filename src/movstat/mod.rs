//! Streaming median over a sliding window, backed by a paired 8-ary heap.
//!
//! [`plain::MedianEngine`] is for streams that never carry NaN.
//! [`nan_aware::NanAwareMedianEngine`] tolerates NaN as a "missing value"
//! that occupies a window slot but is excluded from the median and from
//! `min_count`. Both share the same heap mechanics ([`heap`]) and the same
//! FIFO node pool ([`pool`]); only the bookkeeping around *which* value gets
//! written into a slot differs.
//!
//! [`driver`] wraps either engine for the common cases of feeding a single
//! stream or many independent rows.

pub(crate) mod error;
pub(crate) mod heap;
pub(crate) mod pool;

pub mod driver;
pub mod nan_aware;
pub mod plain;

pub use error::MovStatError;
pub use nan_aware::NanAwareMedianEngine;
pub use plain::MedianEngine;

/// Common read-only surface of a sliding-window median engine.
///
/// Kept separate from each engine's inherent `update`/`insert_init` methods
/// because those differ in signature (the NaN-aware engine additionally
/// exposes `update_checknan`); this trait only covers what every driver and
/// caller needs regardless of which engine they hold.
pub trait MedianQuery {
    /// The median of the values currently in the window, or NaN if fewer
    /// than `min_count` non-missing values have been observed yet.
    fn median(&self) -> f64;

    /// The configured window size.
    fn window(&self) -> usize;

    /// The number of non-missing values currently in the window (at most
    /// `window()`, and possibly fewer while still filling or if NaNs are
    /// occupying slots).
    fn len(&self) -> usize;

    /// True if no non-missing value has been observed yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
