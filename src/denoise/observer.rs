//! Injectable per-stage timing.
//!
//! A scheduler without an observer never reads the clock.

use crate::trace::stage_span;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Processing stage of one reference patch or line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Distance updates, admission and materialization.
    Grouping,
    /// Forward transform, shrinkage and inverse transform.
    Filtering,
    /// Overlap-add into the accumulation window.
    Aggregation,
    /// Emitting finished rows and shifting the window.
    Flush,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Grouping,
        Stage::Filtering,
        Stage::Aggregation,
        Stage::Flush,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Grouping => "grouping",
            Stage::Filtering => "filtering",
            Stage::Aggregation => "aggregation",
            Stage::Flush => "flush",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Membership summary of one channel's group, reported after grouping.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GroupStats {
    pub channel: usize,
    /// Original row of the reference patch.
    pub row: usize,
    /// Original column of the reference patch.
    pub column: usize,
    /// Members after power-of-two truncation, reference included.
    pub size: usize,
    /// Largest distance among the members.
    pub worst_distance: u64,
    /// Admission limit the group was built with.
    pub max_distance: u64,
}

/// Receives the wall time spent in each stage.
pub trait StageObserver: Send + Sync {
    fn record(&self, stage: Stage, elapsed: Duration);

    /// Called once per channel and reference patch. Ignored by default.
    fn record_group(&self, _stats: GroupStats) {}
}

/// Lock-free accumulator of stage timings, shareable through `Arc`.
#[derive(Debug, Default)]
pub struct StageTimings {
    nanos: [AtomicU64; 4],
    calls: [AtomicU64; 4],
    groups: AtomicU64,
    members: AtomicU64,
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total time recorded for `stage`.
    pub fn total(&self, stage: Stage) -> Duration {
        Duration::from_nanos(self.nanos[stage.index()].load(Ordering::Relaxed))
    }

    /// Number of recordings for `stage`.
    pub fn calls(&self, stage: Stage) -> u64 {
        self.calls[stage.index()].load(Ordering::Relaxed)
    }

    /// Total time over all stages.
    pub fn overall(&self) -> Duration {
        Stage::ALL.iter().map(|&s| self.total(s)).sum()
    }

    /// Mean group size over every reported group, 0 before the first one.
    pub fn mean_group_size(&self) -> f64 {
        let groups = self.groups.load(Ordering::Relaxed);
        if groups == 0 {
            return 0.0;
        }
        self.members.load(Ordering::Relaxed) as f64 / groups as f64
    }

    pub fn reset(&self) {
        for stage in Stage::ALL {
            self.nanos[stage.index()].store(0, Ordering::Relaxed);
            self.calls[stage.index()].store(0, Ordering::Relaxed);
        }
        self.groups.store(0, Ordering::Relaxed);
        self.members.store(0, Ordering::Relaxed);
    }
}

impl StageObserver for StageTimings {
    fn record(&self, stage: Stage, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.nanos[stage.index()].fetch_add(nanos, Ordering::Relaxed);
        self.calls[stage.index()].fetch_add(1, Ordering::Relaxed);
    }

    fn record_group(&self, stats: GroupStats) {
        self.groups.fetch_add(1, Ordering::Relaxed);
        self.members.fetch_add(stats.size as u64, Ordering::Relaxed);
    }
}

/// Runs `f` inside the stage's span, reporting its duration to `observer`
/// when one is installed.
pub(crate) fn timed<R>(
    observer: Option<&dyn StageObserver>,
    stage: Stage,
    f: impl FnOnce() -> R,
) -> R {
    let _span = stage_span(stage).entered();
    match observer {
        Some(observer) => {
            let start = Instant::now();
            let out = f();
            observer.record(stage, start.elapsed());
            out
        }
        None => f(),
    }
}
