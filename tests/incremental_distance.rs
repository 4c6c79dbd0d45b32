use bm3d_line::lowlevel::{DistanceEngine, PaddedPlane};
use bm3d_line::{DistanceMetric, OwnedPlane, SearchWindow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_padded(
    rng: &mut StdRng,
    width: usize,
    height: usize,
    step: usize,
    window: &SearchWindow,
) -> PaddedPlane {
    let data = (0..width * height)
        .map(|_| rng.random_range(0..=1023u16))
        .collect();
    let src = OwnedPlane::new(data, width, height).unwrap();
    let mut plane =
        PaddedPlane::new(width, height, 8, step, window.radius_h, window.radius_v).unwrap();
    plane.fill(src.view()).unwrap();
    plane
}

#[test]
fn sliding_distances_match_full_recomputation() {
    let mut rng = StdRng::seed_from_u64(33);
    let window = SearchWindow {
        radius_h: 5,
        step_h: 2,
        radius_v: 3,
        step_v: 1,
    };
    for metric in [DistanceMetric::SquaredL2, DistanceMetric::AbsoluteL1] {
        for step in 1..8 {
            let (width, height) = (29, 13);
            let plane = random_padded(&mut rng, width, height, step, &window);
            let mut engine = DistanceEngine::new(&window, 8, step, metric);
            let positions = (width + step - 8).div_ceil(step);
            let (_, pad_y) = plane.step_pad();
            assert!(pad_y < step);
            for row in (0..height + step - 8).step_by(step) {
                let ref_y = row + window.radius_v;
                for j in 0..positions {
                    let ref_x = window.radius_h + j * step;
                    if j == 0 {
                        engine.rebuild_row(&plane, ref_x, ref_y);
                    } else {
                        engine.advance(&plane, ref_x, ref_y);
                    }
                    assert_eq!(engine.position(), j);
                    for (&offset, &total) in engine.offsets().iter().zip(engine.totals()) {
                        let full = engine.full_distance(&plane, ref_x, ref_y, offset);
                        assert_eq!(total, full, "{metric:?} step {step} row {row} pos {j} {offset:?}");
                    }
                }
            }
        }
    }
}

#[test]
fn zero_offset_has_zero_distance() {
    let mut rng = StdRng::seed_from_u64(34);
    let window = SearchWindow::square(4);
    let plane = random_padded(&mut rng, 16, 16, 3, &window);
    let mut engine = DistanceEngine::new(&window, 8, 3, DistanceMetric::SquaredL2);
    engine.rebuild_row(&plane, 4, 4);
    let centre = engine
        .offsets()
        .iter()
        .position(|&o| o == (0, 0))
        .unwrap();
    assert_eq!(engine.totals()[centre], 0);
    assert!(engine.totals().iter().any(|&d| d > 0));
}
