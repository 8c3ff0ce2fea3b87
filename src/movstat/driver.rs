//! Axis drivers (C8): wiring a raw stream or a row-major matrix onto the
//! engines in [`crate::movstat::plain`] and [`crate::movstat::nan_aware`].
//!
//! Neither engine knows about its caller's data layout; these drivers are
//! the thin, swappable layer that does. [`StreamDriver`] picks between the
//! plain and NaN-aware engine behind one type so a caller doesn't need a
//! generic parameter just to hold "a median engine, which variant TBD by a
//! runtime flag." [`RowMajorDriver`] runs one engine per row of a matrix,
//! the shape bn.move_median(..., axis=1) processes, optionally spreading
//! independent rows across threads with `rayon` behind the `parallel`
//! feature.

use super::error::MovStatError;
use super::nan_aware::NanAwareMedianEngine;
use super::plain::MedianEngine;
use super::MedianQuery;

/// A sliding-window median engine that may be either variant, chosen once
/// at construction.
#[derive(Debug)]
pub enum StreamDriver {
    Plain(MedianEngine),
    NanAware(NanAwareMedianEngine),
}

impl StreamDriver {
    /// A driver backed by [`MedianEngine`], for streams known never to carry
    /// NaN.
    pub fn plain(window: usize, min_count: usize) -> Result<Self, MovStatError> {
        Ok(StreamDriver::Plain(MedianEngine::new(window, min_count)?))
    }

    /// A driver backed by [`NanAwareMedianEngine`], for streams that may
    /// carry NaN.
    pub fn nan_aware(window: usize, min_count: usize) -> Result<Self, MovStatError> {
        Ok(StreamDriver::NanAware(NanAwareMedianEngine::new(
            window, min_count,
        )?))
    }

    /// Admits one value and returns the median of the window after it.
    pub fn feed(&mut self, v: f64) -> f64 {
        match self {
            StreamDriver::Plain(e) => e.feed(v),
            StreamDriver::NanAware(e) => e.feed(v),
        }
    }

    /// Admits a whole slice in order, returning one median per input value.
    pub fn feed_all(&mut self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.feed(v)).collect()
    }

    /// Returns to the empty, Filling state.
    pub fn reset(&mut self) {
        match self {
            StreamDriver::Plain(e) => e.reset(),
            StreamDriver::NanAware(e) => e.reset(),
        }
    }
}

impl MedianQuery for StreamDriver {
    fn median(&self) -> f64 {
        match self {
            StreamDriver::Plain(e) => e.median(),
            StreamDriver::NanAware(e) => e.median(),
        }
    }

    fn window(&self) -> usize {
        match self {
            StreamDriver::Plain(e) => e.window(),
            StreamDriver::NanAware(e) => e.window(),
        }
    }

    fn len(&self) -> usize {
        match self {
            StreamDriver::Plain(e) => e.len(),
            StreamDriver::NanAware(e) => e.len(),
        }
    }
}

/// One independent median engine per row of a row-major matrix, the layout
/// `bn.move_median` uses for a 2D array with `axis=1`: each row slides its
/// own window across its own values, with no interaction between rows.
#[derive(Debug)]
pub struct RowMajorDriver {
    rows: Vec<StreamDriver>,
}

impl RowMajorDriver {
    /// Builds `num_rows` independent plain engines, all with the same
    /// window and `min_count`.
    pub fn new_plain(num_rows: usize, window: usize, min_count: usize) -> Result<Self, MovStatError> {
        let mut rows = Vec::with_capacity(num_rows);
        for _ in 0..num_rows {
            rows.push(StreamDriver::plain(window, min_count)?);
        }
        Ok(RowMajorDriver { rows })
    }

    /// Builds `num_rows` independent NaN-aware engines, all with the same
    /// window and `min_count`.
    pub fn new_nan_aware(
        num_rows: usize,
        window: usize,
        min_count: usize,
    ) -> Result<Self, MovStatError> {
        let mut rows = Vec::with_capacity(num_rows);
        for _ in 0..num_rows {
            rows.push(StreamDriver::nan_aware(window, min_count)?);
        }
        Ok(RowMajorDriver { rows })
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Feeds one column (one value per row) and returns the resulting
    /// medians, one per row.
    ///
    /// # Panics
    /// Panics if `column.len() != self.num_rows()`.
    pub fn feed_column(&mut self, column: &[f64]) -> Vec<f64> {
        assert_eq!(column.len(), self.rows.len(), "column width must match row count");
        self.rows
            .iter_mut()
            .zip(column)
            .map(|(row, &v)| row.feed(v))
            .collect()
    }

    /// Feeds a full row-major matrix, one inner slice per row, and returns
    /// the output matrix of the same shape.
    ///
    /// With the `parallel` feature enabled, rows are processed across a
    /// `rayon` thread pool; each row's engine is independent so there is no
    /// cross-row synchronization to pay for.
    ///
    /// # Panics
    /// Panics if `matrix.len() != self.num_rows()`.
    pub fn feed_matrix(&mut self, matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
        assert_eq!(matrix.len(), self.rows.len(), "matrix row count must match driver row count");
        feed_matrix_impl(&mut self.rows, matrix)
    }

    /// Returns every row to the empty, Filling state.
    pub fn reset_all(&mut self) {
        for row in &mut self.rows {
            row.reset();
        }
    }
}

#[cfg(not(feature = "parallel"))]
fn feed_matrix_impl(rows: &mut [StreamDriver], matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
    rows.iter_mut()
        .zip(matrix)
        .map(|(row, xs)| row.feed_all(xs))
        .collect()
}

#[cfg(feature = "parallel")]
fn feed_matrix_impl(rows: &mut [StreamDriver], matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
    use rayon::prelude::*;
    rows.par_iter_mut()
        .zip(matrix.par_iter())
        .map(|(row, xs)| row.feed_all(xs))
        .collect()
}

/// A sliding-window median over an integer stream.
///
/// Integer input can never be NaN, so this always drives the plain engine
/// internally; it exists only to save callers the `as f64` conversion at
/// every call site.
#[derive(Debug)]
pub struct IntMedianDriver {
    engine: MedianEngine,
}

impl IntMedianDriver {
    pub fn new(window: usize, min_count: usize) -> Result<Self, MovStatError> {
        Ok(IntMedianDriver {
            engine: MedianEngine::new(window, min_count)?,
        })
    }

    /// Admits one value and returns the median of the window after it.
    pub fn feed(&mut self, v: i64) -> f64 {
        self.engine.feed(v as f64)
    }

    /// Admits a whole slice in order, returning one median per input value.
    pub fn feed_all(&mut self, values: &[i64]) -> Vec<f64> {
        values.iter().map(|&v| self.feed(v)).collect()
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }
}

impl MedianQuery for IntMedianDriver {
    fn median(&self) -> f64 {
        self.engine.median()
    }

    fn window(&self) -> usize {
        self.engine.window()
    }

    fn len(&self) -> usize {
        self.engine.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_driver_dispatches_to_plain() {
        let mut d = StreamDriver::plain(3, 3).unwrap();
        let out = d.feed_all(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(out[0].is_nan());
        assert_eq!(&out[2..], &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn stream_driver_dispatches_to_nan_aware() {
        let mut d = StreamDriver::nan_aware(3, 1).unwrap();
        let out = d.feed_all(&[1.0, f64::NAN, 3.0, 4.0]);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[2], 2.0);
    }

    #[test]
    fn int_median_driver_converts_and_feeds() {
        let mut d = IntMedianDriver::new(3, 1).unwrap();
        let out = d.feed_all(&[1, 2, 3, 4, 5]);
        assert_eq!(out, vec![1.0, 1.5, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn row_major_driver_runs_rows_independently() {
        let mut d = RowMajorDriver::new_plain(2, 2, 2).unwrap();
        let matrix = vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]];
        let out = d.feed_matrix(&matrix);
        assert_eq!(out.len(), 2);
        assert!(out[0][0].is_nan());
        assert_eq!(out[0][1], 1.5);
        assert_eq!(out[1][1], 15.0);
    }

    #[test]
    fn row_major_driver_feeds_one_column_at_a_time() {
        let mut d = RowMajorDriver::new_plain(2, 2, 1).unwrap();
        let m0 = d.feed_column(&[1.0, 10.0]);
        assert_eq!(m0, vec![1.0, 10.0]);
        let m1 = d.feed_column(&[2.0, 20.0]);
        assert_eq!(m1, vec![1.5, 15.0]);
    }

    #[test]
    #[should_panic(expected = "column width must match row count")]
    fn feed_column_rejects_mismatched_width() {
        let mut d = RowMajorDriver::new_plain(2, 2, 1).unwrap();
        d.feed_column(&[1.0]);
    }
}
