use seamcarve::lowlevel::VisibilityMap;
use seamcarve::{
    CarveError, ChannelLayout, EnergyKind, ErrorKind, Grid, Orientation, PixelBuffer, PixelView,
    RigidityMap, RigidityMask, SeamPath,
};

fn ramp(width: usize, height: usize, layout: ChannelLayout) -> PixelBuffer {
    let len = width * height * layout.channels();
    let data = (0..len).map(|v| (v % 251) as u8).collect();
    PixelBuffer::new(data, width, height, layout).unwrap()
}

#[test]
fn pixel_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = PixelView::from_slice(&data, 0, 1, 1).err().unwrap();
    assert_eq!(
        err,
        CarveError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = PixelView::from_slice(&data, 1, 0, 1).err().unwrap();
    assert_eq!(
        err,
        CarveError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn pixel_view_rejects_small_buffer() {
    let data = [0u8; 11];

    let err = PixelView::new(&data, 2, 2, 3, 2).err().unwrap();
    assert_eq!(
        err,
        CarveError::BufferLength {
            expected: 12,
            got: 11
        }
    );
}

#[test]
fn strided_view_copies_into_contiguous_buffer() {
    let data: Vec<u8> = (0u8..12).collect();
    let view = PixelView::new(&data, 2, 2, 2, 3).unwrap();
    assert_eq!(view.get(1, 1), Some(&[8u8, 9u8][..]));
    assert!(view.get(2, 0).is_none());

    let buffer = PixelBuffer::from_view(view, ChannelLayout::GreyAlpha).unwrap();
    assert_eq!(buffer.data(), &[0, 1, 2, 3, 6, 7, 8, 9]);
    assert_eq!(buffer.pixel(1, 0).unwrap(), &[2, 3]);
}

#[test]
fn pixel_buffer_checks_sample_count() {
    let err = PixelBuffer::new(vec![0; 5], 2, 1, ChannelLayout::Rgb).unwrap_err();
    assert_eq!(
        err,
        CarveError::BufferLength {
            expected: 6,
            got: 5
        }
    );
    assert_eq!(
        PixelBuffer::new(Vec::new(), 0, 3, ChannelLayout::Grey).unwrap_err(),
        CarveError::InvalidDimensions {
            width: 0,
            height: 3
        }
    );
}

#[test]
fn pixel_access_is_bounds_checked() {
    let image = ramp(3, 2, ChannelLayout::Grey);
    assert_eq!(
        image.pixel(3, 0).unwrap_err(),
        CarveError::OutOfBounds {
            x: 3,
            y: 0,
            width: 3,
            height: 2
        }
    );
    assert_eq!(image.pixel(2, 1).unwrap(), &[5]);
}

#[test]
fn layouts_follow_channel_counts() {
    assert_eq!(ChannelLayout::from_channels(1), ChannelLayout::Grey);
    assert_eq!(ChannelLayout::from_channels(4), ChannelLayout::Rgba);
    assert_eq!(ChannelLayout::from_channels(5), ChannelLayout::Cmyka);
    assert_eq!(
        ChannelLayout::from_channels(7),
        ChannelLayout::Custom { channels: 7 }
    );
    assert_eq!(ChannelLayout::Cmyka.alpha_channel(), Some(4));
    assert_eq!(ChannelLayout::Cmyk.black_channel(), Some(3));
    assert!(ChannelLayout::Cmyk.is_subtractive());
    assert_eq!(ChannelLayout::Rgba.color_channels(), 0..3);
}

#[test]
fn readers_validate_channel_counts() {
    assert!(EnergyKind::Brightness.validate(ChannelLayout::Cmyka).is_ok());
    assert!(EnergyKind::Luma.validate(ChannelLayout::Grey).is_ok());
    assert_eq!(
        EnergyKind::Rgba.validate(ChannelLayout::Rgb).unwrap_err(),
        CarveError::ChannelMismatch {
            reader: "rgba",
            expected: 4,
            got: 3
        }
    );
    assert!(EnergyKind::Custom(2)
        .validate(ChannelLayout::GreyAlpha)
        .is_ok());
    assert!(EnergyKind::Custom(0).validate(ChannelLayout::Grey).is_err());
}

#[test]
fn seam_round_trip_restores_both_orientations() {
    let image = ramp(5, 4, ChannelLayout::Rgb);

    let vertical = SeamPath::new(Orientation::Vertical, vec![0, 1, 2, 2]);
    let (narrow, removed) = image.clone().remove_seam(&vertical).unwrap();
    assert_eq!((narrow.width(), narrow.height()), (4, 4));
    assert_eq!(removed.samples().len(), 4 * 3);
    assert_eq!(removed.path(), &vertical);
    assert_eq!(narrow.restore_seam(removed).unwrap(), image);

    let horizontal = SeamPath::new(Orientation::Horizontal, vec![3, 2, 2, 1, 0]);
    let (short, removed) = image.clone().remove_seam(&horizontal).unwrap();
    assert_eq!((short.width(), short.height()), (5, 3));
    assert_eq!(short.restore_seam(removed).unwrap(), image);
}

#[test]
fn remove_seam_rejects_bad_paths() {
    let image = ramp(3, 2, ChannelLayout::Grey);
    let short = SeamPath::new(Orientation::Vertical, vec![0]);
    assert!(matches!(
        image.clone().remove_seam(&short).unwrap_err(),
        CarveError::InvalidSeam { .. }
    ));
    let outside = SeamPath::new(Orientation::Vertical, vec![0, 3]);
    assert!(matches!(
        image.remove_seam(&outside).unwrap_err(),
        CarveError::InvalidSeam { .. }
    ));

    let column = ramp(1, 2, ChannelLayout::Grey);
    let seam = SeamPath::new(Orientation::Vertical, vec![0, 0]);
    assert_eq!(
        column.remove_seam(&seam).unwrap_err(),
        CarveError::InvalidTargetSize {
            width: 0,
            height: 2
        }
    );
}

#[test]
fn grid_indexing_never_wraps_rows() {
    let grid = Grid::from_vec(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
    assert_eq!(grid.get(2, 1), Some(5));
    assert_eq!(grid.get(3, 0), None);
    assert!(grid.try_get(3, 0).is_err());
    let t = grid.transposed().unwrap();
    assert_eq!((t.width(), t.height()), (2, 3));
    assert_eq!(t.row(2), &[2, 5]);
}

#[test]
fn rigidity_bias_grows_with_offset() {
    let map = RigidityMap::new(2.0, 2, 5).unwrap();
    assert_eq!(map.bias(0), 0.0);
    assert!(map.bias(1) > 0.0);
    assert!(map.bias(-2) > map.bias(1));
    assert_eq!(map.bias(-2), map.bias(2));
    assert!(map.bias(3).is_infinite());

    assert!(RigidityMap::new(-1.0, 1, 5).is_err());
    assert!(RigidityMap::new(1.0, 0, 5).is_err());

    let negative = Grid::from_vec(2, 1, vec![1.0, -0.5]).unwrap();
    assert!(RigidityMask::new(negative).is_err());
}

#[test]
fn visibility_map_tracks_generations() {
    let mut map = VisibilityMap::new(2, 2).unwrap();
    map.record_removal(0, 0, 0).unwrap();
    map.record_removal(1, 1, 0).unwrap();
    map.record_removal(1, 0, 1).unwrap();
    assert_eq!(map.depth(), 2);
    assert_eq!(map.generation(0, 1).unwrap(), None);
    assert_eq!(map.generation(1, 0).unwrap(), Some(1));
    map.clear();
    assert_eq!(map.depth(), 0);
}

#[test]
fn error_kinds_classify_failures() {
    assert_eq!(CarveError::Cancelled.kind(), ErrorKind::Cancelled);
    assert_eq!(
        CarveError::Allocation {
            what: "grid",
            len: 1
        }
        .kind(),
        ErrorKind::Resource
    );
    assert_eq!(
        CarveError::InvalidConfig("x").kind(),
        ErrorKind::ContractViolation
    );
}
