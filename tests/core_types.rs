use bm3d_line::{
    Bm3dConfig, Bm3dError, Denoiser, NoiseParams, OwnedPlane, PlaneView, SearchWindow,
};

#[test]
fn plane_view_strided_rows() {
    let data: Vec<u16> = (0..20).collect();
    let view = PlaneView::new(&data, 3, 4, 5).unwrap();
    assert_eq!(view.row(1), Some(&data[5..8]));
    assert_eq!(view.get(2, 3), Some(&17));
    assert_eq!(view.get(3, 0), None);
    assert!(view.row(4).is_none());

    let owned = OwnedPlane::from_view(view).unwrap();
    assert_eq!(owned.data(), &[0, 1, 2, 5, 6, 7, 10, 11, 12, 15, 16, 17]);
}

#[test]
fn plane_view_rejects_bad_layouts() {
    let data = vec![0u16; 10];
    assert!(matches!(
        PlaneView::new(&data, 4, 3, 3),
        Err(Bm3dError::InvalidStride { .. })
    ));
    assert!(matches!(
        PlaneView::from_slice(&data, 4, 3),
        Err(Bm3dError::BufferTooSmall { needed: 12, got: 10 })
    ));
    assert!(matches!(
        OwnedPlane::new(vec![0; 13], 4, 3),
        Err(Bm3dError::InvalidDimensions { .. })
    ));
}

#[test]
fn owned_plane_u8_conversions() {
    let plane = OwnedPlane::from_u8(&[0, 128, 255, 7], 2, 2).unwrap();
    assert_eq!(plane.data(), &[0, 128, 255, 7]);
    let wide = OwnedPlane::new(vec![0, 300, 255, 1], 2, 2).unwrap();
    assert_eq!(wide.to_u8(), vec![0, 255, 255, 1]);
}

#[test]
fn search_window_offsets_are_row_major() {
    let window = SearchWindow {
        radius_h: 2,
        step_h: 2,
        radius_v: 1,
        step_v: 1,
    };
    let offsets = window.offsets();
    assert_eq!(offsets.len(), window.len());
    assert_eq!(offsets[0], (-2, -1));
    assert_eq!(offsets[1], (0, -1));
    assert_eq!(offsets[3], (-2, 0));
    assert!(offsets.contains(&(0, 0)));
    assert!(SearchWindow::square(0).is_empty());
}

#[test]
fn load_checks_planes_against_config() {
    let config = Bm3dConfig {
        channels: 2,
        ..Bm3dConfig::new(16, 12)
    };
    let mut denoiser = Denoiser::new(config).unwrap();
    let good = OwnedPlane::zeroed(16, 12).unwrap();
    let small = OwnedPlane::zeroed(16, 11).unwrap();
    let noise = NoiseParams::new(4.0);

    assert_eq!(
        denoiser.load(&[good.view()], &noise).unwrap_err(),
        Bm3dError::ChannelMismatch {
            expected: 2,
            got: 1
        }
    );
    assert_eq!(
        denoiser.load(&[good.view(), small.view()], &noise).unwrap_err(),
        Bm3dError::PlaneSizeMismatch {
            channel: 1,
            width: 16,
            height: 11,
            expected_width: 16,
            expected_height: 12,
        }
    );
    let hot = OwnedPlane::new(vec![256; 16 * 12], 16, 12).unwrap();
    assert!(matches!(
        denoiser.load(&[good.view(), hot.view()], &noise),
        Err(Bm3dError::InvalidInput(_))
    ));
    assert!(matches!(
        denoiser.load(&[good.view(), good.view()], &NoiseParams::new(-1.0)),
        Err(Bm3dError::InvalidSigma { channel: 0 })
    ));
    denoiser.load(&[good.view(), good.view()], &noise).unwrap();
}

#[test]
fn next_line_checks_output_planes() {
    let mut denoiser = Denoiser::new(Bm3dConfig::new(16, 16)).unwrap();
    let plane = OwnedPlane::zeroed(16, 16).unwrap();
    denoiser.load(&[plane.view()], &NoiseParams::new(1.0)).unwrap();
    let mut wrong = vec![OwnedPlane::zeroed(15, 16).unwrap()];
    assert!(matches!(
        denoiser.next_line(&mut wrong),
        Err(Bm3dError::PlaneSizeMismatch { .. })
    ));
    let mut none: Vec<OwnedPlane> = Vec::new();
    assert!(matches!(
        denoiser.next_line(&mut none),
        Err(Bm3dError::ChannelMismatch { .. })
    ));
}

#[test]
fn errors_render_readable_messages() {
    let err = Bm3dError::ImageSmallerThanPatch {
        width: 4,
        height: 9,
        patch_size: 8,
    };
    assert_eq!(err.to_string(), "image 4x9 is smaller than the 8x8 patch");
    assert_eq!(Bm3dError::NotLoaded.to_string(), "no image loaded");
}
