use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use ela_forensics::{
    analysis::ela::{ElaAnalyzer, ElaParameters},
    raster::{Layout, Raster},
};

fn texture(width: u32, height: u32) -> Raster {
    let data = (0..width * height * 3)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8)
        .collect();
    Raster::from_raw(width, height, Layout::Rgb, data).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let image = texture(512, 512);

    for quality in [75, 88, 100] {
        let analyzer = ElaAnalyzer::new(ElaParameters::new(quality, 10).unwrap());
        c.bench_function(&format!("ELA 512x512 RGB at quality {}", quality), |b| {
            b.iter(|| analyzer.analyze(black_box(&image)).unwrap())
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
