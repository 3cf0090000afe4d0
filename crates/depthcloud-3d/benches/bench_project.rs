use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use depthcloud_3d::camera::{CameraModel, CameraParams};
use depthcloud_3d::project;
use depthcloud_image::{DepthImage, DepthKind};

fn make_raster(width: usize, height: usize) -> DepthImage {
    let data = (0..width * height)
        .map(|i| 0.5 + (i % 97) as f32 * 0.05)
        .collect();
    DepthImage::new(width, height, data).unwrap()
}

fn params_for(model: CameraModel, width: usize, height: usize) -> CameraParams {
    CameraParams {
        model,
        k1: 1.0,
        k2: -0.01,
        ..CameraParams::pinhole(
            width as f64 * 0.8,
            width as f64 * 0.8,
            width as f64 / 2.0,
            height as f64 / 2.0,
        )
    }
}

fn bench_project(c: &mut Criterion) {
    let mut group = c.benchmark_group("project");

    for &(width, height) in &[(320usize, 240usize), (640, 480)] {
        let image = make_raster(width, height);
        let label = format!("{width}x{height}");

        for model in [
            CameraModel::PinholeIdeal,
            CameraModel::FisheyeEquidistant,
            CameraModel::FisheyeKannalaBrandt,
        ] {
            let params = params_for(model, width, height);
            group.bench_function(BenchmarkId::new(format!("{model:?}"), &label), |b| {
                b.iter(|| {
                    let cloud = project(&image, DepthKind::Depth, &params);
                    black_box(cloud.point_count);
                });
            });
        }
    }
}

criterion_group!(benches, bench_project);
criterion_main!(benches);
