#![cfg(feature = "rayon")]

use bm3d_line::lowlevel::{DistanceEngine, PaddedPlane};
use bm3d_line::{
    Bm3dConfig, Denoiser, DistanceMetric, NoiseParams, OwnedPlane, Precision, SearchWindow,
};

fn make_plane(width: usize, height: usize) -> OwnedPlane {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 11) ^ (y * 3) ^ (x * y)) & 0xFF;
            data.push(value as u16);
        }
    }
    OwnedPlane::new(data, width, height).unwrap()
}

#[test]
fn parallel_distances_match_sequential() {
    let window = SearchWindow::square(12);
    let src = make_plane(40, 30);
    let mut plane = PaddedPlane::new(40, 30, 8, 3, 12, 12).unwrap();
    plane.fill(src.view()).unwrap();

    let mut seq = DistanceEngine::new(&window, 8, 3, DistanceMetric::SquaredL2);
    let mut par = seq.clone();
    seq.rebuild_row(&plane, 12, 15);
    par.rebuild_row_par(&plane, 12, 15);
    assert_eq!(seq.totals(), par.totals());
    for j in 1..12 {
        seq.advance(&plane, 12 + 3 * j, 15);
        par.advance_par(&plane, 12 + 3 * j, 15);
        assert_eq!(seq.totals(), par.totals());
        assert_eq!(seq.position(), par.position());
    }
}

#[test]
fn parallel_denoiser_matches_sequential() {
    let (width, height) = (48, 40);
    let input = make_plane(width, height);
    let noise = NoiseParams::new(12.0);
    for precision in [Precision::Fixed, Precision::Float] {
        let base = Bm3dConfig {
            precision,
            ..Bm3dConfig::new(width, height)
        };
        let mut sequential = Denoiser::new(base.clone()).unwrap();
        let expected = sequential.denoise(&[input.view()], None, &noise).unwrap();

        for workers in [0, 3] {
            let config = Bm3dConfig {
                parallel: true,
                workers,
                ..base.clone()
            };
            let mut parallel = Denoiser::new(config).unwrap();
            let got = parallel.denoise(&[input.view()], None, &noise).unwrap();
            assert_eq!(got, expected, "{precision:?} workers {workers}");
        }
    }
}
