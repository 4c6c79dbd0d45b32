use bm3d_line::{Bm3dConfig, LineScheduler, NoiseParams, OwnedPlane, SearchWindow};

fn gradient(width: usize, height: usize) -> OwnedPlane {
    let data = (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x * 7 + y * 5) % 256) as u16))
        .collect();
    OwnedPlane::new(data, width, height).unwrap()
}

fn emitted_rows(config: Bm3dConfig) -> Vec<std::ops::Range<usize>> {
    let (width, height) = (config.width, config.height);
    let mut scheduler = LineScheduler::<i32>::new(config).unwrap();
    let input = gradient(width, height);
    scheduler
        .load(&[input.view()], &NoiseParams::new(8.0))
        .unwrap();
    let mut out = vec![OwnedPlane::zeroed(width, height).unwrap()];
    let mut ranges = Vec::new();
    while let Some(rows) = scheduler.next_line(&mut out).unwrap() {
        ranges.push(rows);
    }
    ranges
}

#[test]
fn rows_are_emitted_once_in_order() {
    for (width, height) in [(8, 8), (9, 13), (20, 23), (31, 17), (16, 40)] {
        for step in 1..8 {
            for radius in [0usize, 2, 5] {
                let config = Bm3dConfig {
                    patch_step: step,
                    search: SearchWindow {
                        radius_h: radius.max(1),
                        step_h: 1,
                        radius_v: radius,
                        step_v: 1,
                    },
                    max_group_size: 4,
                    ..Bm3dConfig::new(width, height)
                };
                let ranges = emitted_rows(config);
                let mut next = 0;
                for rows in &ranges {
                    assert_eq!(rows.start, next, "{width}x{height} step {step} radius {radius}");
                    next = rows.end;
                }
                assert_eq!(next, height, "{width}x{height} step {step} radius {radius}");
            }
        }
    }
}

#[test]
fn window_taller_than_image_flushes_at_the_end() {
    let config = Bm3dConfig {
        search: SearchWindow::square(16),
        ..Bm3dConfig::new(12, 9)
    };
    let ranges = emitted_rows(config);
    let non_empty: Vec<_> = ranges.iter().filter(|r| !r.is_empty()).collect();
    assert_eq!(non_empty.len(), 1);
    assert_eq!(*non_empty[0], 0..9);
}

#[test]
fn line_count_follows_step() {
    let config = Bm3dConfig {
        patch_step: 3,
        search: SearchWindow::square(3),
        ..Bm3dConfig::new(24, 20)
    };
    // Lines at rows 0, 3, ..., 12 (the last one reaching the bottom edge).
    assert_eq!(emitted_rows(config).len(), 5);
}

#[test]
fn every_pixel_receives_weight() {
    let (width, height) = (19, 14);
    let config = Bm3dConfig {
        patch_step: 5,
        search: SearchWindow::square(2),
        ..Bm3dConfig::new(width, height)
    };
    let mut scheduler = LineScheduler::<f32>::new(config).unwrap();
    let input = OwnedPlane::new(vec![77; width * height], width, height).unwrap();
    scheduler
        .load(&[input.view()], &NoiseParams::new(0.0))
        .unwrap();
    let out = scheduler.run().unwrap();
    assert_eq!(out[0], input);
}
