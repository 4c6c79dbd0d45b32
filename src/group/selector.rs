//! Capacity-bounded, distance-sorted group of patches.
//!
//! The selector owns a fixed arena of `capacity` patch slots allocated once.
//! Membership is an ordering of slot indices: inserting at a sorted position
//! rotates indices, never patch buffers, so the scan allocates nothing per
//! reference patch.

use crate::group::Patch;
use crate::plane::PaddedPlane;
use crate::transform::{hadamard, Coefficient, PATCH_SIZE};
use crate::util::math::floor_log2;

/// Distance-sorted group anchored at one reference patch.
#[derive(Clone, Debug)]
pub struct GroupSelector<C> {
    slots: Vec<Patch<C>>,
    order: Vec<usize>,
    len: usize,
    log_len: u32,
    max_dist: u64,
    scratch: Vec<usize>,
}

impl<C: Coefficient> GroupSelector<C> {
    /// Allocates `capacity` slots (at least one, for the reference patch).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![Patch::default(); capacity],
            order: (0..capacity).collect(),
            len: 0,
            log_len: 0,
            max_dist: u64::MAX,
            scratch: Vec::with_capacity(capacity),
        }
    }

    /// Maximum number of members.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Sets the admission limit; candidates farther than this are rejected.
    pub fn set_max_dist(&mut self, max_dist: u64) {
        self.max_dist = max_dist;
    }

    pub fn max_dist(&self) -> u64 {
        self.max_dist
    }

    /// Current number of members.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `log2(len)`, valid after [`truncate_pow2`](Self::truncate_pow2).
    pub fn log_len(&self) -> u32 {
        self.log_len
    }

    /// Clears the group and inserts the reference patch at distance 0.
    pub fn reset_to_reference(&mut self) {
        let slot = &mut self.slots[self.order[0]];
        slot.dx = 0;
        slot.dy = 0;
        slot.dist = 0;
        self.len = 1;
        self.log_len = 0;
    }

    /// Offers a candidate; returns whether it entered the group.
    ///
    /// The insertion point is after every member with a distance `<= dist`, so
    /// earlier candidates win ties. A full group drops its worst member first,
    /// which still lets a closer candidate in.
    pub fn admit(&mut self, dx: isize, dy: isize, dist: u64) -> bool {
        if dx == 0 && dy == 0 {
            return false;
        }
        if dist > self.max_dist {
            return false;
        }
        let slots = &self.slots;
        let idx = self.order[..self.len].partition_point(|&s| slots[s].dist <= dist);
        if idx >= self.capacity() {
            return false;
        }
        if self.len == self.capacity() {
            self.len -= 1;
        }
        self.order[idx..=self.len].rotate_right(1);
        let slot = &mut self.slots[self.order[idx]];
        slot.dx = dx;
        slot.dy = dy;
        slot.dist = dist;
        self.len += 1;
        true
    }

    /// Shrinks the group to the largest power of two not above its size.
    pub fn truncate_pow2(&mut self) {
        self.log_len = floor_log2(self.len.max(1));
        self.len = 1 << self.log_len;
    }

    /// Truncates to a power of two and copies every member's samples from
    /// `plane`, where the reference patch's top-left corner is `(ref_x, ref_y)`
    /// in padded coordinates.
    pub fn materialize(&mut self, plane: &PaddedPlane, ref_x: usize, ref_y: usize) {
        self.truncate_pow2();
        for &s in &self.order[..self.len] {
            let patch = &mut self.slots[s];
            let x = ref_x.wrapping_add_signed(patch.dx);
            let y = ref_y.wrapping_add_signed(patch.dy);
            for (r, dst) in patch.values.chunks_exact_mut(PATCH_SIZE).enumerate() {
                let row = &plane.row(y + r)[x..x + PATCH_SIZE];
                for (d, &v) in dst.iter_mut().zip(row) {
                    *d = C::from_sample(v);
                }
            }
        }
    }

    /// Adopts the members (offsets, distances, size) of `driver`.
    ///
    /// Used when one channel's or plane's grouping decides membership for
    /// another; sample values still come from [`materialize`](Self::materialize).
    pub fn copy_layout_from(&mut self, driver: &GroupSelector<C>) {
        debug_assert!(driver.len <= self.capacity());
        self.len = driver.len;
        self.log_len = driver.log_len;
        for (i, src) in driver.members().enumerate() {
            let dst = &mut self.slots[self.order[i]];
            dst.dx = src.dx;
            dst.dy = src.dy;
            dst.dist = src.dist;
        }
    }

    /// Members in group order; member 0 is the reference patch.
    pub fn members(&self) -> impl Iterator<Item = &Patch<C>> + '_ {
        self.order[..self.len].iter().map(|&s| &self.slots[s])
    }

    /// Returns member `i` in group order.
    pub fn member(&self, i: usize) -> &Patch<C> {
        &self.slots[self.order[i]]
    }

    /// Returns member `i` in group order, mutably.
    pub fn member_mut(&mut self, i: usize) -> &mut Patch<C> {
        &mut self.slots[self.order[i]]
    }

    /// Distance of the farthest member; members are kept sorted.
    pub fn worst_distance(&self) -> u64 {
        self.members().last().map_or(0, |p| p.dist)
    }

    /// Runs the group-axis butterfly over the current members.
    pub fn butterfly(&mut self) {
        hadamard::butterfly(
            &mut self.slots,
            &mut self.order[..self.len],
            &mut self.scratch,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::GroupSelector;

    fn dists(group: &GroupSelector<i32>) -> Vec<u64> {
        group.members().map(|p| p.dist).collect()
    }

    #[test]
    fn keeps_members_sorted_and_bounded() {
        let mut group = GroupSelector::<i32>::new(4);
        group.set_max_dist(100);
        group.reset_to_reference();
        assert!(group.admit(1, 0, 50));
        assert!(group.admit(2, 0, 10));
        assert!(!group.admit(3, 0, 101));
        assert!(group.admit(4, 0, 30));
        assert_eq!(dists(&group), vec![0, 10, 30, 50]);
        // Full: the worst member is evicted for a closer candidate.
        assert!(group.admit(5, 0, 20));
        assert_eq!(dists(&group), vec![0, 10, 20, 30]);
        // A candidate that would land past the last slot is rejected.
        assert!(!group.admit(6, 0, 40));
        assert_eq!(group.len(), 4);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let mut group = GroupSelector::<i32>::new(8);
        group.reset_to_reference();
        group.admit(1, 0, 7);
        group.admit(2, 0, 7);
        group.admit(3, 0, 0);
        let offsets: Vec<isize> = group.members().map(|p| p.dx).collect();
        assert_eq!(offsets, vec![0, 3, 1, 2]);
    }

    #[test]
    fn reference_offset_is_never_admitted() {
        let mut group = GroupSelector::<f32>::new(4);
        group.reset_to_reference();
        assert!(!group.admit(0, 0, 0));
        assert_eq!(group.len(), 1);
        assert!(group.member(0).is_reference());
    }

    #[test]
    fn truncates_to_power_of_two() {
        let mut group = GroupSelector::<i32>::new(16);
        group.reset_to_reference();
        for d in 1..=6 {
            group.admit(d as isize, 1, d);
        }
        group.truncate_pow2();
        assert_eq!(group.len(), 4);
        assert_eq!(group.log_len(), 2);
        assert_eq!(dists(&group), vec![0, 1, 2, 3]);
        assert_eq!(group.worst_distance(), 3);
    }

    #[test]
    fn copied_layout_matches_driver() {
        let mut driver = GroupSelector::<i32>::new(8);
        driver.reset_to_reference();
        driver.admit(-2, 1, 9);
        driver.admit(3, -1, 4);
        driver.truncate_pow2();
        let mut follower = GroupSelector::<i32>::new(8);
        follower.copy_layout_from(&driver);
        let a: Vec<_> = driver.members().map(|p| (p.dx, p.dy, p.dist)).collect();
        let b: Vec<_> = follower.members().map(|p| (p.dx, p.dy, p.dist)).collect();
        assert_eq!(a, b);
        assert_eq!(follower.log_len(), 1);
    }
}
