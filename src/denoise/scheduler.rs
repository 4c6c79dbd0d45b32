//! Streaming line scheduler.
//!
//! One call to [`LineScheduler::next_line`] processes a full row of reference
//! patches: it refreshes the block-matching distances, groups, filters and
//! aggregates every reference patch from left to right, then emits the output
//! rows that no later line can touch and shifts the accumulation window.
//!
//! Geometry (per channel, `rh`/`rv` the search radii, `ps` the patch size,
//! `st` the step):
//! - reference patches sit at original coordinates `(k * st, row)` for
//!   `k * st < width + st - ps`, and lines at `row = 0, st, 2 st, ...` while
//!   `row < height + st - ps`;
//! - accumulator row `r` holds original row `row - rv + r` and accumulator
//!   column `c` holds padded column `c`;
//! - after the line at `row`, every original row below `row + st - rv` is
//!   final; the last line flushes everything that is left.

use crate::denoise::config::{Bm3dConfig, GroupingMode, NoiseParams, Precision};
use crate::denoise::observer::{timed, GroupStats, Stage, StageObserver};
use crate::distance::DistanceEngine;
use crate::filter::{
    forward_group, hard_threshold, inverse_group, wiener_shrink, wiener_weight, Shrinkage,
};
use crate::group::GroupSelector;
use crate::plane::{OwnedPlane, PaddedPlane, PlaneView};
use crate::trace::{trace_event, trace_span};
use crate::transform::{wiener_threshold, Bior15, BlockTransform, Coefficient};
use crate::aggregate::Accumulator;
use crate::util::{Bm3dError, Bm3dResult};
use std::ops::Range;
use std::sync::Arc;

/// Shrinkage parameters of one channel for the current load.
#[derive(Copy, Clone, Debug)]
struct ChannelThresholds<C> {
    hard: C,
    wiener: f64,
}

/// Line-by-line BM3D engine for one numeric mode.
///
/// Owns every buffer it needs; nothing is allocated while scanning. Use
/// [`load`](Self::load) (hard thresholding) or
/// [`load_with_basic`](Self::load_with_basic) (Wiener) before driving it with
/// [`next_line`](Self::next_line) or [`run`](Self::run).
pub struct LineScheduler<C: Coefficient, T: BlockTransform<C> = Bior15> {
    config: Bm3dConfig,
    transform: T,
    frac_bits: u32,
    noisy: Vec<PaddedPlane>,
    basic: Vec<PaddedPlane>,
    engines: Vec<DistanceEngine>,
    noisy_groups: Vec<GroupSelector<C>>,
    basic_groups: Vec<GroupSelector<C>>,
    accumulators: Vec<Accumulator<C>>,
    thresholds: Vec<ChannelThresholds<C>>,
    weights: Vec<C::Accum>,
    references_per_line: usize,
    row_cursor: usize,
    emitted: usize,
    loaded: bool,
    observer: Option<Arc<dyn StageObserver>>,
    #[cfg(feature = "rayon")]
    pool: Option<rayon::ThreadPool>,
}

impl<C: Coefficient, T: BlockTransform<C> + Default> LineScheduler<C, T> {
    /// Validates `config` and allocates every buffer.
    pub fn new(config: Bm3dConfig) -> Bm3dResult<Self> {
        Self::with_transform(config, T::default())
    }
}

impl<C: Coefficient, T: BlockTransform<C>> LineScheduler<C, T> {
    /// Like [`new`](Self::new) with an explicit block transform.
    pub fn with_transform(config: Bm3dConfig, transform: T) -> Bm3dResult<Self> {
        let precision = if C::FIXED {
            Precision::Fixed
        } else {
            Precision::Float
        };
        config.validate_for(precision)?;

        let ps = config.patch_size;
        let st = config.patch_step;
        let (rh, rv) = (config.search.radius_h, config.search.radius_v);
        let channels = config.channels;
        let wiener = config.shrinkage.needs_basic();

        let padded = PaddedPlane::new(config.width, config.height, ps, st, rh, rv)?;
        let engine_count = match config.grouping {
            GroupingMode::SharedLuma => 1,
            GroupingMode::PerChannel => channels,
        };
        let engine = DistanceEngine::new(&config.search, ps, st, config.metric);
        let group = GroupSelector::new(config.max_group_size);
        let accumulator = Accumulator::new(padded.width(), ps + 2 * rv);

        #[cfg(feature = "rayon")]
        let pool = if config.parallel && config.workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .build()
                .map_err(|_| Bm3dError::InvalidInput("failed to build rayon thread pool"))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            frac_bits: transform.coeff_frac_bits(),
            transform,
            noisy: vec![padded.clone(); channels],
            basic: if wiener {
                vec![padded; channels]
            } else {
                Vec::new()
            },
            engines: vec![engine; engine_count],
            noisy_groups: vec![group.clone(); channels],
            basic_groups: if wiener {
                vec![group; channels]
            } else {
                Vec::new()
            },
            accumulators: vec![accumulator; channels],
            thresholds: vec![
                ChannelThresholds {
                    hard: C::default(),
                    wiener: 0.0,
                };
                channels
            ],
            weights: vec![Default::default(); channels],
            references_per_line: (config.width + st - ps).div_ceil(st),
            row_cursor: 0,
            emitted: 0,
            loaded: false,
            observer: None,
            #[cfg(feature = "rayon")]
            pool,
            config,
        })
    }

    pub fn config(&self) -> &Bm3dConfig {
        &self.config
    }

    /// Installs a timing observer.
    pub fn set_observer(&mut self, observer: Arc<dyn StageObserver>) {
        self.observer = Some(observer);
    }

    /// Original row of the next line of reference patches.
    pub fn row_cursor(&self) -> usize {
        self.row_cursor
    }

    /// Number of reference patches in every line.
    pub fn references_per_line(&self) -> usize {
        self.references_per_line
    }

    /// Loads noisy planes for hard-threshold filtering.
    pub fn load(&mut self, noisy: &[PlaneView<'_, u16>], noise: &NoiseParams) -> Bm3dResult<()> {
        if self.config.shrinkage.needs_basic() {
            return Err(Bm3dError::ShrinkageMismatch {
                reason: "wiener shrinkage needs a basic estimate",
            });
        }
        self.load_planes(noisy, None, noise)
    }

    /// Loads noisy planes and their basic estimate for Wiener filtering.
    pub fn load_with_basic(
        &mut self,
        noisy: &[PlaneView<'_, u16>],
        basic: &[PlaneView<'_, u16>],
        noise: &NoiseParams,
    ) -> Bm3dResult<()> {
        if !self.config.shrinkage.needs_basic() {
            return Err(Bm3dError::ShrinkageMismatch {
                reason: "hard thresholding takes no basic estimate",
            });
        }
        self.load_planes(noisy, Some(basic), noise)
    }

    fn load_planes(
        &mut self,
        noisy: &[PlaneView<'_, u16>],
        basic: Option<&[PlaneView<'_, u16>]>,
        noise: &NoiseParams,
    ) -> Bm3dResult<()> {
        let _span = trace_span!(
            "bm3d_load",
            channels = self.config.channels,
            width = self.config.width,
            height = self.config.height
        )
        .entered();
        self.loaded = false;
        self.check_inputs(noisy)?;
        if let Some(basic) = basic {
            self.check_inputs(basic)?;
        }
        let sigmas = noise.resolve(self.config.channels)?;
        let limits = noise.resolve_max_distance(self.config.channels, self.config.patch_size)?;

        for (plane, view) in self.noisy.iter_mut().zip(noisy) {
            plane.fill(*view)?;
        }
        if let Some(basic) = basic {
            for (plane, view) in self.basic.iter_mut().zip(basic) {
                plane.fill(*view)?;
            }
        }

        for (group, &max_dist) in self.driver_groups_mut().iter_mut().zip(&limits) {
            group.set_max_dist(max_dist);
        }
        let frac_bits = self.frac_bits;
        for (t, &sigma) in self.thresholds.iter_mut().zip(&sigmas) {
            t.hard = C::hard_threshold(sigma, frac_bits);
            t.wiener = wiener_threshold(sigma, frac_bits);
        }
        self.reset();
        self.loaded = true;
        Ok(())
    }

    fn check_inputs(&self, planes: &[PlaneView<'_, u16>]) -> Bm3dResult<()> {
        if planes.len() != self.config.channels {
            return Err(Bm3dError::ChannelMismatch {
                expected: self.config.channels,
                got: planes.len(),
            });
        }
        let max = self.config.max_sample();
        for (channel, view) in planes.iter().enumerate() {
            if view.width() != self.config.width || view.height() != self.config.height {
                return Err(Bm3dError::PlaneSizeMismatch {
                    channel,
                    width: view.width(),
                    height: view.height(),
                    expected_width: self.config.width,
                    expected_height: self.config.height,
                });
            }
            for y in 0..view.height() {
                let row = view.row(y).ok_or(Bm3dError::InvalidDimensions {
                    width: view.width(),
                    height: view.height(),
                })?;
                if row.iter().any(|&v| v > max) {
                    return Err(Bm3dError::InvalidInput(
                        "sample exceeds the configured bit depth",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Rewinds to the first line without reloading the planes.
    pub fn reset(&mut self) {
        self.row_cursor = 0;
        self.emitted = 0;
        for acc in &mut self.accumulators {
            acc.clear();
        }
    }

    /// True once every line has been processed.
    pub fn is_finished(&self) -> bool {
        let ps = self.config.patch_size;
        let st = self.config.patch_step;
        self.row_cursor >= self.config.height + st - ps
    }

    /// Processes the next line of reference patches and writes the rows it
    /// completes into `out` (one plane per channel, original size).
    ///
    /// Returns the range of original rows written, which may be empty near
    /// the top edge, or `None` once the image is done.
    pub fn next_line(&mut self, out: &mut [OwnedPlane]) -> Bm3dResult<Option<Range<usize>>> {
        if !self.loaded {
            return Err(Bm3dError::NotLoaded);
        }
        self.check_outputs(out)?;
        if self.is_finished() {
            return Ok(None);
        }

        let _span = trace_span!(
            "bm3d_line",
            row = self.row_cursor,
            references = self.references_per_line
        )
        .entered();
        let observer = self.observer.clone();
        let observer = observer.as_deref();
        let st = self.config.patch_step;
        let rh = self.config.search.radius_h;
        let rv = self.config.search.radius_v;
        let ref_y = self.row_cursor + rv;
        let mut members = 0usize;

        for j in 0..self.references_per_line {
            let ref_x = rh + j * st;
            timed(observer, Stage::Grouping, || {
                self.update_distances(j, ref_x, ref_y);
                self.group_reference(ref_x, ref_y);
            });
            if let Some(observer) = observer {
                self.report_groups(observer, ref_x, ref_y);
            }
            members += self.noisy_groups[0].len();
            timed(observer, Stage::Filtering, || self.filter_groups());
            timed(observer, Stage::Aggregation, || {
                for ((acc, group), &weight) in self
                    .accumulators
                    .iter_mut()
                    .zip(&self.noisy_groups)
                    .zip(&self.weights)
                {
                    acc.add_group(group, weight, ref_x, rv);
                }
            });
        }
        trace_event!(
            "group_stats",
            row = self.row_cursor,
            mean_group_size = members as f64 / self.references_per_line as f64
        );

        let rows = timed(observer, Stage::Flush, || self.flush(out));
        trace_event!("rows_emitted", start = rows.start, count = rows.len());
        Ok(Some(rows))
    }

    fn check_outputs(&self, out: &[OwnedPlane]) -> Bm3dResult<()> {
        if out.len() != self.config.channels {
            return Err(Bm3dError::ChannelMismatch {
                expected: self.config.channels,
                got: out.len(),
            });
        }
        for (channel, plane) in out.iter().enumerate() {
            if plane.width() != self.config.width || plane.height() != self.config.height {
                return Err(Bm3dError::PlaneSizeMismatch {
                    channel,
                    width: plane.width(),
                    height: plane.height(),
                    expected_width: self.config.width,
                    expected_height: self.config.height,
                });
            }
        }
        Ok(())
    }

    /// Rebuilds (first reference of a line) or advances the distance rings.
    fn update_distances(&mut self, position: usize, ref_x: usize, ref_y: usize) {
        let guides = if self.config.shrinkage.needs_basic() {
            &self.basic
        } else {
            &self.noisy
        };
        for (engine, plane) in self.engines.iter_mut().zip(guides) {
            #[cfg(feature = "rayon")]
            if self.config.parallel {
                let run = move || {
                    if position == 0 {
                        engine.rebuild_row_par(plane, ref_x, ref_y);
                    } else {
                        engine.advance_par(plane, ref_x, ref_y);
                    }
                };
                match &self.pool {
                    Some(pool) => pool.install(run),
                    None => run(),
                }
                continue;
            }
            if position == 0 {
                engine.rebuild_row(plane, ref_x, ref_y);
            } else {
                engine.advance(plane, ref_x, ref_y);
            }
        }
    }

    /// Admits candidates in scan order, propagates the layout to the other
    /// channels and planes, and copies the member samples.
    fn group_reference(&mut self, ref_x: usize, ref_y: usize) {
        let wiener = self.config.shrinkage.needs_basic();
        {
            let drivers = if wiener {
                &mut self.basic_groups
            } else {
                &mut self.noisy_groups
            };
            for (engine, group) in self.engines.iter().zip(drivers.iter_mut()) {
                group.reset_to_reference();
                for (&(dx, dy), &dist) in engine.offsets().iter().zip(engine.totals()) {
                    group.admit(dx, dy, dist);
                }
                group.truncate_pow2();
            }
            if self.engines.len() < drivers.len() {
                let (head, tail) = drivers.split_at_mut(1);
                for group in tail {
                    group.copy_layout_from(&head[0]);
                }
            }
        }
        if wiener {
            for (noisy, basic) in self.noisy_groups.iter_mut().zip(&self.basic_groups) {
                noisy.copy_layout_from(basic);
            }
            for (group, plane) in self.basic_groups.iter_mut().zip(&self.basic) {
                group.materialize(plane, ref_x, ref_y);
            }
        }
        for (group, plane) in self.noisy_groups.iter_mut().zip(&self.noisy) {
            group.materialize(plane, ref_x, ref_y);
        }
    }

    fn report_groups(&self, observer: &dyn StageObserver, ref_x: usize, ref_y: usize) {
        let drivers = if self.config.shrinkage.needs_basic() {
            &self.basic_groups
        } else {
            &self.noisy_groups
        };
        let last_engine = self.engines.len() - 1;
        for (channel, group) in drivers.iter().enumerate() {
            // Shared layouts were admitted under the luma limit.
            let admitting = &drivers[channel.min(last_engine)];
            observer.record_group(GroupStats {
                channel,
                row: ref_y - self.config.search.radius_v,
                column: ref_x - self.config.search.radius_h,
                size: group.len(),
                worst_distance: group.worst_distance(),
                max_distance: admitting.max_dist(),
            });
        }
    }

    /// Transforms, shrinks and inverts every channel's group and records its
    /// aggregation weight.
    fn filter_groups(&mut self) {
        let transform = &self.transform;
        for c in 0..self.config.channels {
            let thresholds = self.thresholds[c];
            let noisy = &mut self.noisy_groups[c];
            let weight = match self.config.shrinkage {
                Shrinkage::HardThreshold => {
                    forward_group(noisy, transform);
                    let nonzeros = hard_threshold(noisy, thresholds.hard);
                    inverse_group(noisy, transform);
                    self.config.weighting.hard_weight(nonzeros)
                }
                Shrinkage::Wiener => {
                    let basic = &mut self.basic_groups[c];
                    forward_group(basic, transform);
                    forward_group(noisy, transform);
                    let sum = wiener_shrink(basic, noisy, thresholds.wiener);
                    inverse_group(noisy, transform);
                    wiener_weight::<C>(sum)
                }
            };
            self.weights[c] = C::group_weight(weight);
        }
    }

    /// Emits the rows finished by the current line and slides the window.
    fn flush(&mut self, out: &mut [OwnedPlane]) -> Range<usize> {
        let height = self.config.height;
        let ps = self.config.patch_size;
        let st = self.config.patch_step;
        let rh = self.config.search.radius_h;
        let rv = self.config.search.radius_v;
        let max = self.config.max_sample();

        let last_line = self.row_cursor + ps >= height;
        let end = if last_line {
            height
        } else {
            (self.row_cursor + st).saturating_sub(rv).min(height)
        };
        let rows = self.emitted..end.max(self.emitted);
        for y in rows.clone() {
            let acc_row = y + rv - self.row_cursor;
            for (acc, plane) in self.accumulators.iter().zip(out.iter_mut()) {
                if let Some(dst) = plane.row_mut(y) {
                    acc.resolve_row(acc_row, rh, dst, max);
                }
            }
        }
        self.emitted = rows.end;
        for acc in &mut self.accumulators {
            acc.shift_up(st);
        }
        self.row_cursor += st;
        rows
    }

    /// Resets and processes every line, returning freshly allocated planes.
    pub fn run(&mut self) -> Bm3dResult<Vec<OwnedPlane>> {
        let mut out = (0..self.config.channels)
            .map(|_| OwnedPlane::zeroed(self.config.width, self.config.height))
            .collect::<Bm3dResult<Vec<_>>>()?;
        self.run_into(&mut out)?;
        Ok(out)
    }

    /// Resets and processes every line into `out`.
    pub fn run_into(&mut self, out: &mut [OwnedPlane]) -> Bm3dResult<()> {
        let _span = trace_span!("bm3d_run").entered();
        if !self.loaded {
            return Err(Bm3dError::NotLoaded);
        }
        self.reset();
        while self.next_line(out)?.is_some() {}
        Ok(())
    }

    fn driver_groups_mut(&mut self) -> &mut [GroupSelector<C>] {
        if self.config.shrinkage.needs_basic() {
            &mut self.basic_groups
        } else {
            &mut self.noisy_groups
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LineScheduler;
    use crate::denoise::config::{Bm3dConfig, NoiseParams};
    use crate::distance::SearchWindow;
    use crate::plane::OwnedPlane;
    use crate::util::Bm3dError;

    fn config(width: usize, height: usize) -> Bm3dConfig {
        Bm3dConfig {
            search: SearchWindow::square(4),
            max_group_size: 8,
            ..Bm3dConfig::new(width, height)
        }
    }

    #[test]
    fn refuses_to_run_before_load() {
        let mut scheduler = LineScheduler::<i32>::new(config(16, 16)).unwrap();
        let mut out = vec![OwnedPlane::zeroed(16, 16).unwrap()];
        assert_eq!(scheduler.next_line(&mut out).unwrap_err(), Bm3dError::NotLoaded);
    }

    #[test]
    fn rejects_basic_estimate_in_hard_mode() {
        let mut scheduler = LineScheduler::<f32>::new(config(16, 16)).unwrap();
        let plane = OwnedPlane::zeroed(16, 16).unwrap();
        let views = [plane.view()];
        let err = scheduler
            .load_with_basic(&views, &views, &NoiseParams::new(5.0))
            .unwrap_err();
        assert!(matches!(err, Bm3dError::ShrinkageMismatch { .. }));
    }

    #[test]
    fn emits_every_row_exactly_once() {
        let (w, h) = (20, 23);
        let mut scheduler = LineScheduler::<i32>::new(config(w, h)).unwrap();
        let data: Vec<u16> = (0..w * h).map(|i| (i % 200) as u16).collect();
        let plane = OwnedPlane::new(data, w, h).unwrap();
        scheduler.load(&[plane.view()], &NoiseParams::new(10.0)).unwrap();
        let mut out = vec![OwnedPlane::zeroed(w, h).unwrap()];
        let mut next = 0;
        while let Some(rows) = scheduler.next_line(&mut out).unwrap() {
            assert_eq!(rows.start, next);
            next = rows.end;
        }
        assert_eq!(next, h);
        assert!(scheduler.is_finished());
        assert!(scheduler.next_line(&mut out).unwrap().is_none());
    }
}
