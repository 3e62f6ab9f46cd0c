//! Simulation defaults.
//!
//! The record-count range is half-open: a subject produces between
//! [`DEFAULT_MIN_COUNT`] and `DEFAULT_MAX_COUNT - 1` records per stage.

/// Lower bound (inclusive) of the per-stage record count.
pub const DEFAULT_MIN_COUNT: usize = 3;

/// Upper bound (exclusive) of the per-stage record count.
pub const DEFAULT_MAX_COUNT: usize = 50;

/// Stage dimension key inserted by the configuration layer when none is given.
pub const DEFAULT_STAGE_KEY: &str = "Stage";

/// Single stage category used together with [`DEFAULT_STAGE_KEY`].
pub const DEFAULT_STAGE_LABEL: &str = "main";

/// Population label used when the caller supplies none.
pub const DEFAULT_POPULATION_LABEL: &str = "";

/// Build a subject identifier: `"{label}_S{index}"`.
#[inline]
pub fn subject_id(label: &str, index: usize) -> String {
    format!("{}_S{}", label, index)
}
