use criterion::{criterion_group, criterion_main, Criterion};
use seamcarve::lowlevel::{CarverConfig, CostTable, SideBias};
use seamcarve::util::CancelToken;
use seamcarve::{
    ChannelLayout, EnergyFunction, EnergyKind, GradientKind, Orientation, PixelBuffer,
    ResizeOrder, RigidityMap, SeamCarver, Session, SessionConfig,
};
use std::hint::black_box;

fn make_image(width: usize, height: usize, layout: ChannelLayout) -> PixelBuffer {
    let channels = layout.channels();
    let mut data = Vec::with_capacity(width * height * channels);
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let value = ((x * 13) ^ (y * 7) ^ (x * y) ^ (c * 31)) & 0xFF;
                data.push(value as u8);
            }
        }
    }
    PixelBuffer::new(data, width, height, layout).unwrap()
}

fn bench_energy(c: &mut Criterion) {
    let image = make_image(256, 256, ChannelLayout::Rgb);
    for (name, kind) in [
        ("energy_brightness_xabs", EnergyKind::Brightness),
        ("energy_luma_xabs", EnergyKind::Luma),
    ] {
        let function = EnergyFunction::new(kind, GradientKind::XAbs);
        c.bench_function(name, |b| {
            b.iter(|| black_box(function.energy_map(&image).unwrap()));
        });
    }
    let norm = EnergyFunction::new(EnergyKind::Brightness, GradientKind::Norm);
    c.bench_function("energy_brightness_norm", |b| {
        b.iter(|| black_box(norm.energy_map(&image).unwrap()));
    });
}

fn bench_cost_table(c: &mut Criterion) {
    let image = make_image(256, 256, ChannelLayout::Grey);
    let energy = EnergyFunction::default().energy_map(&image).unwrap();
    let cancel = CancelToken::new();

    let loose = RigidityMap::new(0.0, 1, 256).unwrap();
    c.bench_function("cost_table_k1", |b| {
        b.iter(|| {
            black_box(
                CostTable::build(&energy, &loose, None, SideBias::Left, false, &cancel).unwrap(),
            )
        });
    });

    let rigid = RigidityMap::new(0.5, 3, 256).unwrap();
    c.bench_function("cost_table_k3_rigid", |b| {
        b.iter(|| {
            black_box(
                CostTable::build(&energy, &rigid, None, SideBias::Left, false, &cancel).unwrap(),
            )
        });
    });
}

fn bench_carve(c: &mut Criterion) {
    let image = make_image(128, 96, ChannelLayout::Rgb);

    for (name, caching) in [("carve_32_cached", true), ("carve_32_uncached", false)] {
        let config = CarverConfig {
            caching,
            ..CarverConfig::default()
        };
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut carver =
                    SeamCarver::new(image.clone(), Orientation::Vertical, config).unwrap();
                carver.ensure_depth(32).unwrap();
                black_box(carver.current_buffer().unwrap())
            });
        });
    }

    let mut carver =
        SeamCarver::new(image.clone(), Orientation::Vertical, CarverConfig::default()).unwrap();
    carver.ensure_depth(64).unwrap();
    carver.finish();
    let mut target = 64;
    c.bench_function("buffer_for_size_cycle", |b| {
        b.iter(|| {
            target = if target >= 128 { 64 } else { target + 1 };
            black_box(carver.buffer_for_size(target).unwrap())
        });
    });
}

fn bench_session(c: &mut Criterion) {
    let image = make_image(96, 96, ChannelLayout::Rgb);
    for (name, order) in [
        ("session_width_first", ResizeOrder::WidthFirst),
        ("session_interleaved", ResizeOrder::Interleaved),
    ] {
        let config = SessionConfig {
            resize_order: order,
            ..SessionConfig::default()
        };
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut session = Session::new(image.clone(), config).unwrap();
                black_box(session.resize_to(80, 72).unwrap())
            });
        });
    }
}

criterion_group!(
    benches,
    bench_energy,
    bench_cost_table,
    bench_carve,
    bench_session
);
criterion_main!(benches);
