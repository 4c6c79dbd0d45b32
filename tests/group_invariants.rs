use bm3d_line::lowlevel::GroupSelector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Reference patch followed by the closest admissible candidates, ties in
/// scan order, cut to a power of two.
fn expected_members(
    candidates: &[(isize, isize, u64)],
    capacity: usize,
    max_dist: u64,
) -> Vec<(isize, isize, u64)> {
    let mut admissible: Vec<_> = candidates
        .iter()
        .copied()
        .filter(|&(dx, dy, d)| (dx, dy) != (0, 0) && d <= max_dist)
        .collect();
    admissible.sort_by_key(|&(_, _, d)| d);
    let mut members = vec![(0, 0, 0)];
    members.extend(admissible.into_iter().take(capacity - 1));
    let keep = 1 << members.len().ilog2();
    members.truncate(keep);
    members
}

#[test]
fn selection_matches_sorted_model() {
    let mut rng = StdRng::seed_from_u64(21);
    for capacity in [1usize, 2, 3, 8, 16, 17, 32] {
        for _ in 0..40 {
            let max_dist = rng.random_range(0..60u64);
            let count = rng.random_range(0..120usize);
            let candidates: Vec<(isize, isize, u64)> = (0..count)
                .map(|i| {
                    let dx = (i % 11) as isize - 5;
                    let dy = (i / 11) as isize - 5;
                    (dx, dy, rng.random_range(0..50u64))
                })
                .collect();

            let mut group = GroupSelector::<i32>::new(capacity);
            group.set_max_dist(max_dist);
            group.reset_to_reference();
            for &(dx, dy, d) in &candidates {
                group.admit(dx, dy, d);
            }
            group.truncate_pow2();

            let got: Vec<_> = group.members().map(|p| (p.dx, p.dy, p.dist)).collect();
            assert_eq!(got, expected_members(&candidates, capacity, max_dist));
            assert!(group.len().is_power_of_two());
            assert_eq!(1 << group.log_len(), group.len());
            assert!(group.member(0).is_reference());
        }
    }
}

#[test]
fn reference_and_far_candidates_are_refused() {
    let mut group = GroupSelector::<f32>::new(4);
    group.set_max_dist(100);
    group.reset_to_reference();
    assert!(!group.admit(0, 0, 0));
    assert!(!group.admit(1, 0, 101));
    assert!(group.admit(1, 0, 100));
    assert_eq!(group.len(), 2);
}

#[test]
fn full_group_evicts_its_worst_member() {
    let mut group = GroupSelector::<i32>::new(3);
    group.reset_to_reference();
    assert!(group.admit(1, 0, 30));
    assert!(group.admit(2, 0, 20));
    assert!(!group.admit(3, 0, 30));
    assert!(group.admit(4, 0, 10));
    let offsets: Vec<_> = group.members().map(|p| p.dx).collect();
    assert_eq!(offsets, vec![0, 4, 2]);
}

#[test]
fn copied_layout_follows_the_driver() {
    let mut driver = GroupSelector::<i32>::new(8);
    driver.reset_to_reference();
    for (i, dx) in (1..6).enumerate() {
        driver.admit(dx, -dx, i as u64);
    }
    driver.truncate_pow2();
    let mut follower = GroupSelector::<i32>::new(8);
    follower.copy_layout_from(&driver);
    assert_eq!(follower.len(), 4);
    assert_eq!(follower.log_len(), 2);
    let a: Vec<_> = driver.members().map(|p| (p.dx, p.dy)).collect();
    let b: Vec<_> = follower.members().map(|p| (p.dx, p.dy)).collect();
    assert_eq!(a, b);
}
