//! Tracing hooks for the line scheduler.
//!
//! Spans: `bm3d_two_pass` around both passes, `bm3d_load` per load,
//! `bm3d_run` per image, `bm3d_line` per line of reference patches, and one
//! debug span per [`Stage`] named after it (`bm3d_grouping`,
//! `bm3d_filtering`, `bm3d_aggregation`, `bm3d_flush`).
//! Events: `group_stats` (mean group size of a line) and `rows_emitted`.
//! Without the `tracing` feature all of it compiles away.

use crate::denoise::Stage;

#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Debug event with key/value fields. Values are still evaluated when
/// tracing is off.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;

/// Debug span covering one stage of one reference patch or line.
#[cfg(feature = "tracing")]
pub(crate) fn stage_span(stage: Stage) -> tracing::Span {
    match stage {
        Stage::Grouping => tracing::debug_span!("bm3d_grouping"),
        Stage::Filtering => tracing::debug_span!("bm3d_filtering"),
        Stage::Aggregation => tracing::debug_span!("bm3d_aggregation"),
        Stage::Flush => tracing::debug_span!("bm3d_flush"),
    }
}

#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn stage_span(_stage: Stage) -> NoopSpan {
    NoopSpan
}

#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
