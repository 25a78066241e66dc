//! Benchmarks for the CPU rasterizer and WGSL generation.
//!
//! Run with: `cargo bench --bench software_draw`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use windshell::prelude::*;
use windshell::shader::generate_render_shader;

fn bench_software_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("software_frame");
    group.sample_size(20);

    let field = WindField::prevailing(360, 181).unwrap();
    for count in [5_000u32, 35_000] {
        let config = RendererConfig::default()
            .with_particle_count(count)
            .with_seed(1);
        let mut renderer = WindRenderer::new(SoftwareBackend::new(&config), config).unwrap();
        renderer.set_wind(&field).unwrap();
        let mut frame = Framebuffer::new(512, 512);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(renderer.draw(&mut frame).unwrap()))
        });
    }

    group.finish();
}

fn bench_shader_generation(c: &mut Criterion) {
    let config = RendererConfig::default();
    c.bench_function("generate_render_shader", |b| {
        b.iter(|| black_box(generate_render_shader(black_box(&config))))
    });
}

criterion_group!(benches, bench_software_frame, bench_shader_generation);
criterion_main!(benches);
