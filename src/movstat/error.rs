/*! Construction-time error taxonomy (C7)

# About
Every failure this crate can report happens at construction, before any
engine exists -- exactly as spec.md 7 requires ("rejected by the driver's
argument validation before the engine is constructed"). Nothing in the hot
path (`insert_init`, `update`, `update_checknan`, `median`) returns a
`Result`; their preconditions are the caller's responsibility, documented on
each method.

Generalizes the `Box<dyn std::error::Error>` convention used by
`lists::queues::priority_queue` in the donor tree into a proper enum, since
unlike a free-form `"Invalid key".into()` string, this crate's failure modes
are small and fixed, and callers benefit from being able to match on which
one occurred.
*/

use std::fmt;

/// Everything that can go wrong constructing a median engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovStatError {
    /// `window` was zero. Spec requires `W >= 1`.
    ZeroWindow,
    /// `min_count` exceeded `window`. Spec requires `0 <= min_count <= W`.
    MinCountExceedsWindow { min_count: usize, window: usize },
}

impl fmt::Display for MovStatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovStatError::ZeroWindow => write!(f, "window size must be at least 1"),
            MovStatError::MinCountExceedsWindow { min_count, window } => write!(
                f,
                "min_count ({min_count}) must not exceed the window size ({window})"
            ),
        }
    }
}

impl std::error::Error for MovStatError {}

pub(crate) fn validate(window: usize, min_count: usize) -> Result<(), MovStatError> {
    if window < 1 {
        return Err(MovStatError::ZeroWindow);
    }
    if min_count > window {
        return Err(MovStatError::MinCountExceedsWindow { min_count, window });
    }
    Ok(())
}
