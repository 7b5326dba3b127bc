use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seamcarve::{
    CarveError, ChannelLayout, EnergyKind, GradientKind, Grid, PixelBuffer, ResizeOrder, Resized,
    RigidityMask, Session, SessionConfig,
};

fn noise(width: usize, height: usize, layout: ChannelLayout, seed: u64) -> PixelBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height * layout.channels())
        .map(|_| rng.random_range(0..=255))
        .collect();
    PixelBuffer::new(data, width, height, layout).unwrap()
}

fn complete(outcome: Resized) -> PixelBuffer {
    match outcome {
        Resized::Complete(buffer) => buffer,
        Resized::Cancelled(_) => panic!("resize was cancelled"),
    }
}

fn sorted(values: &[u8]) -> Vec<u8> {
    let mut v = values.to_vec();
    v.sort_unstable();
    v
}

#[test]
fn bias_only_energy_removes_leftmost_cheapest_pixel() {
    let values = [5u8, 1, 1, 5, 1, 1, 5, 1, 1, 5];
    let source = PixelBuffer::new(values.to_vec(), 10, 1, ChannelLayout::Grey).unwrap();
    let config = SessionConfig {
        gradient: GradientKind::Null,
        ..SessionConfig::default()
    };
    let mut session = Session::new(source, config).unwrap();
    let bias = Grid::from_vec(10, 1, values.iter().map(|&v| f32::from(v)).collect()).unwrap();
    session.set_energy_bias(Some(bias)).unwrap();

    let out = complete(session.resize_to(9, 1).unwrap());
    assert_eq!(out.data(), &[5, 1, 5, 1, 1, 5, 1, 1, 5]);

    let out = complete(session.resize_to(4, 1).unwrap());
    assert_eq!(out.data(), &[5, 5, 5, 5]);
    assert_eq!(session.carved_depth(), 6);
}

#[test]
fn uniform_image_shrinks_and_returns() {
    let source = PixelBuffer::filled(4, 4, ChannelLayout::Rgb, &[90, 120, 30]).unwrap();
    let mut session = Session::new(source.clone(), SessionConfig::default()).unwrap();

    let narrow = complete(session.resize_to(3, 4).unwrap());
    assert_eq!((narrow.width(), narrow.height()), (3, 4));
    assert!(narrow.data().chunks(3).all(|p| p == [90, 120, 30]));

    let back = complete(session.resize_to(4, 4).unwrap());
    assert_eq!(back, source);

    // Enlarging the narrowed image inserts a seam instead of replaying one.
    let mut widen = Session::new(narrow, SessionConfig::default()).unwrap();
    let grown = complete(widen.resize_to(4, 4).unwrap());
    assert_eq!((grown.width(), grown.height()), (4, 4));
    assert_eq!(sorted(grown.data()), sorted(source.data()));
}

#[test]
fn repeated_requests_reuse_recorded_seams() {
    let source = noise(12, 8, ChannelLayout::Rgb, 1);
    let mut session = Session::new(source, SessionConfig::default()).unwrap();

    let first = complete(session.resize_to(9, 8).unwrap());
    assert_eq!(session.carved_depth(), 3);
    let smaller = complete(session.resize_to(7, 8).unwrap());
    assert_eq!(session.carved_depth(), 5);
    assert_eq!((smaller.width(), smaller.height()), (7, 8));
    let again = complete(session.resize_to(9, 8).unwrap());
    assert_eq!(again, first);
    assert_eq!(session.carved_depth(), 5);
}

#[test]
fn reconfiguration_drops_recorded_seams() {
    let source = noise(10, 6, ChannelLayout::Grey, 2);
    let mut session = Session::new(source, SessionConfig::default()).unwrap();
    session.resize_to(7, 6).unwrap();
    assert_eq!(session.carved_depth(), 3);

    session.set_rigidity(2.0).unwrap();
    assert_eq!(session.carved_depth(), 0);
    assert_eq!(session.config().rigidity, 2.0);

    session.resize_to(8, 6).unwrap();
    assert_eq!(session.carved_depth(), 2);
    session.set_energy_kind(EnergyKind::Luma).unwrap();
    assert_eq!(session.carved_depth(), 0);

    session.resize_to(8, 6).unwrap();
    session.set_gradient(GradientKind::Norm).unwrap();
    assert_eq!(session.carved_depth(), 0);

    session.resize_to(8, 6).unwrap();
    session.invalidate();
    assert_eq!(session.carved_depth(), 0);
}

#[test]
fn enlargement_runs_in_rounds() {
    let source = noise(6, 4, ChannelLayout::Rgb, 3);
    let config = SessionConfig {
        max_enlargement_ratio: 1.5,
        ..SessionConfig::default()
    };
    let mut session = Session::new(source.clone(), config).unwrap();

    let wide = complete(session.resize_to(14, 4).unwrap());
    assert_eq!((wide.width(), wide.height()), (14, 4));

    let tall = complete(session.resize_to(6, 7).unwrap());
    assert_eq!((tall.width(), tall.height()), (6, 7));

    // Every source row survives in the widened image, in order.
    for y in 0..4 {
        let row = &wide.data()[y * 14 * 3..(y + 1) * 14 * 3];
        let mut pixels = row.chunks(3);
        for x in 0..6 {
            let wanted = source.pixel(x, y).unwrap();
            assert!(pixels.any(|p| p == wanted));
        }
    }
}

#[test]
fn single_column_cannot_be_enlarged() {
    let source = noise(1, 3, ChannelLayout::Grey, 4);
    let mut session = Session::new(source, SessionConfig::default()).unwrap();
    assert_eq!(
        session.resize_to(2, 3).unwrap_err(),
        CarveError::InvalidTargetSize {
            width: 2,
            height: 3
        }
    );
}

#[test]
fn height_only_request_carves_rows() {
    let source = noise(6, 5, ChannelLayout::GreyAlpha, 5);
    let mut session = Session::new(source, SessionConfig::default()).unwrap();
    let out = complete(session.resize_to(6, 3).unwrap());
    assert_eq!((out.width(), out.height()), (6, 3));
    assert_eq!(out.layout(), ChannelLayout::GreyAlpha);
    assert_eq!(session.carved_depth(), 0);
}

#[test]
fn every_order_reaches_the_requested_size() {
    let source = noise(8, 8, ChannelLayout::Rgb, 6);
    for order in [
        ResizeOrder::WidthFirst,
        ResizeOrder::HeightFirst,
        ResizeOrder::Interleaved,
    ] {
        let config = SessionConfig {
            resize_order: order,
            ..SessionConfig::default()
        };
        let mut session = Session::new(source.clone(), config).unwrap();
        for (w, h) in [(6, 5), (5, 8), (10, 4), (8, 8), (3, 11)] {
            let out = complete(session.resize_to(w, h).unwrap());
            assert_eq!((out.width(), out.height()), (w, h), "{order:?}");
        }
    }
}

#[test]
fn height_first_carves_rows_on_the_source() {
    let source = noise(7, 9, ChannelLayout::Grey, 7);
    let config = SessionConfig {
        resize_order: ResizeOrder::HeightFirst,
        ..SessionConfig::default()
    };
    let mut session = Session::new(source, config).unwrap();
    session.resize_to(5, 6).unwrap();
    assert_eq!(session.carved_depth(), 3);
}

#[test]
fn energy_bias_protects_a_column() {
    let mut data = Vec::new();
    for _ in 0..5 {
        data.extend_from_slice(&[10, 20, 30, 40, 50, 60]);
    }
    let source = PixelBuffer::new(data, 6, 5, ChannelLayout::Grey).unwrap();
    let config = SessionConfig {
        gradient: GradientKind::Null,
        ..SessionConfig::default()
    };
    let mut session = Session::new(source, config).unwrap();
    let mut bias = Grid::new(6, 5, 0.0f32).unwrap();
    for y in 0..5 {
        bias[(2, y)] = 1000.0;
    }
    session.set_energy_bias(Some(bias)).unwrap();

    let out = complete(session.resize_to(2, 3).unwrap());
    assert_eq!((out.width(), out.height()), (2, 3));
    assert_eq!(out.data(), &[30, 60, 30, 60, 30, 60]);
}

#[test]
fn suppressed_column_goes_before_cheaper_ones() {
    let mut data = Vec::new();
    for _ in 0..3 {
        data.extend_from_slice(&[10, 20, 30, 40, 50, 60]);
    }
    let source = PixelBuffer::new(data, 6, 3, ChannelLayout::Grey).unwrap();
    let config = SessionConfig {
        gradient: GradientKind::Null,
        ..SessionConfig::default()
    };
    let mut session = Session::new(source, config).unwrap();
    let mut bias = Grid::new(6, 3, 5.0f32).unwrap();
    for y in 0..3 {
        bias[(0, y)] = 1.0;
    }
    session.set_energy_bias(Some(bias)).unwrap();
    let out = complete(session.resize_to(5, 3).unwrap());
    assert_eq!(out.data(), [20, 30, 40, 50, 60].repeat(3).as_slice());

    let mut weights = Grid::new(6, 3, 0.0f32).unwrap();
    for y in 0..3 {
        weights[(3, y)] = 100.0;
    }
    session.set_suppression_mask(Some(weights)).unwrap();
    assert_eq!(session.carved_depth(), 0);
    let out = complete(session.resize_to(5, 3).unwrap());
    assert_eq!(out.data(), [10, 20, 30, 50, 60].repeat(3).as_slice());
    let out = complete(session.resize_to(4, 3).unwrap());
    assert_eq!(out.data(), [20, 30, 50, 60].repeat(3).as_slice());

    assert!(matches!(
        session.set_suppression_mask(Some(Grid::new(6, 3, -5.0).unwrap())),
        Err(CarveError::InvalidConfig(_))
    ));
}

#[test]
fn suppressed_row_goes_first_when_carving_height() {
    let data: Vec<u8> = (1..=6u8).flat_map(|y| [y * 10; 3]).collect();
    let source = PixelBuffer::new(data, 3, 6, ChannelLayout::Grey).unwrap();
    let config = SessionConfig {
        gradient: GradientKind::Null,
        ..SessionConfig::default()
    };
    let mut session = Session::new(source, config).unwrap();
    let mut weights = Grid::new(3, 6, 0.0f32).unwrap();
    for x in 0..3 {
        weights[(x, 3)] = 100.0;
    }
    session.set_suppression_mask(Some(weights)).unwrap();
    let out = complete(session.resize_to(3, 5).unwrap());
    let expected: Vec<u8> = [10u8, 20, 30, 50, 60].iter().flat_map(|&v| [v; 3]).collect();
    assert_eq!(out.data(), expected.as_slice());
}

#[test]
fn rigidity_mask_is_accepted_and_carried() {
    let source = noise(9, 7, ChannelLayout::Rgb, 8);
    let config = SessionConfig {
        rigidity: 5.0,
        max_step: 2,
        ..SessionConfig::default()
    };
    let mut session = Session::new(source, config).unwrap();
    let factors = Grid::new(9, 7, 0.5f32).unwrap();
    session
        .set_rigidity_mask(Some(RigidityMask::new(factors).unwrap()))
        .unwrap();
    let out = complete(session.resize_to(6, 5).unwrap());
    assert_eq!((out.width(), out.height()), (6, 5));
    let out = complete(session.resize_to(12, 9).unwrap());
    assert_eq!((out.width(), out.height()), (12, 9));
}

#[test]
fn replace_source_starts_over() {
    let first = noise(8, 6, ChannelLayout::Grey, 9);
    let mut session = Session::new(first.clone(), SessionConfig::default()).unwrap();
    session
        .set_energy_bias(Some(Grid::new(8, 6, 1.0).unwrap()))
        .unwrap();
    session.resize_to(6, 6).unwrap();

    let second = noise(5, 5, ChannelLayout::Grey, 10);
    let old = session.replace_source(second.clone()).unwrap();
    assert_eq!(old, first);
    assert_eq!(session.carved_depth(), 0);
    assert_eq!(session.source(), &second);

    let out = complete(session.resize_to(4, 5).unwrap());
    assert_eq!((out.width(), out.height()), (4, 5));
    assert_eq!(session.into_source(), second);
}

#[test]
fn invalid_requests_are_rejected() {
    let source = noise(4, 4, ChannelLayout::Rgb, 11);
    let mut session = Session::new(source.clone(), SessionConfig::default()).unwrap();
    assert_eq!(
        session.resize_to(0, 4).unwrap_err(),
        CarveError::InvalidTargetSize {
            width: 0,
            height: 4
        }
    );
    assert!(matches!(
        session.set_energy_bias(Some(Grid::new(3, 4, 0.0).unwrap())),
        Err(CarveError::InvalidConfig(_))
    ));
    assert!(matches!(
        session.set_energy_bias(Some(Grid::new(4, 4, -1.0).unwrap())),
        Err(CarveError::InvalidConfig(_))
    ));
    assert_eq!(
        session.set_energy_kind(EnergyKind::Rgba).unwrap_err(),
        CarveError::ChannelMismatch {
            reader: "rgba",
            expected: 4,
            got: 3
        }
    );
    assert_eq!(session.config().energy_kind, EnergyKind::Brightness);
    assert!(session.set_rigidity(-1.0).is_err());

    let bad = SessionConfig {
        max_step: 0,
        ..SessionConfig::default()
    };
    assert!(Session::new(source, bad).is_err());
}

#[test]
fn custom_reader_reads_raw_channels() {
    let source = noise(7, 5, ChannelLayout::Custom { channels: 2 }, 12);
    let config = SessionConfig {
        energy_kind: EnergyKind::Custom(2),
        gradient: GradientKind::SumAbs,
        caching_enabled: false,
        ..SessionConfig::default()
    };
    let mut session = Session::new(source, config).unwrap();
    let out = complete(session.resize_to(5, 4).unwrap());
    assert_eq!((out.width(), out.height()), (5, 4));
    assert_eq!(out.channels(), 2);
}
