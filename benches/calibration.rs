use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scanpipe_rs::scan_pipeline::{AsicGeneration, ColorMode, GammaCurves};
use scanpipe_rs::scan_pipeline::calibration::reduce::sort_and_average;
use scanpipe_rs::scan_pipeline::gamma::builder::build_gamma;
use scanpipe_rs::scan_pipeline::reassembly::reorder::{color_pack, line_pack};

fn generate_calibration_buffer(lines: usize, positions: usize) -> Vec<u8> {
    let mut raw = Vec::with_capacity(lines * positions * 2);
    for line in 0..lines {
        for pos in 0..positions {
            let value = (0xE000 + ((line * 31 + pos * 7) % 0x3F)) as u16;
            raw.extend_from_slice(&value.to_le_bytes());
        }
    }
    raw
}

fn generate_stripe(lines: usize, bytes_per_line: usize) -> Vec<u8> {
    (0..lines * bytes_per_line).map(|i| (i % 251) as u8).collect()
}

fn benchmark_reduction_widths(c: &mut Criterion) {
    let mut group = c.benchmark_group("shading_reduction");

    let widths = vec![
        (2550usize, "2550px"),
        (5100, "5100px"),
        (10200, "10200px"),
    ];

    for (pixels, label) in widths {
        let positions = pixels * 3;
        let raw = generate_calibration_buffer(12, positions);

        group.bench_with_input(BenchmarkId::from_parameter(label), &raw, |b, raw| {
            b.iter(|| sort_and_average(black_box(raw), 12, positions, 2));
        });
    }

    group.finish();
}

fn benchmark_reduction_line_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("shading_reduction_lines");
    let positions = 2550 * 3;

    for lines in [4usize, 12, 36] {
        let raw = generate_calibration_buffer(lines, positions);
        group.bench_with_input(
            BenchmarkId::from_parameter(lines),
            &raw,
            |b, raw| {
                b.iter(|| sort_and_average(black_box(raw), lines, positions, 2));
            },
        );
    }

    group.finish();
}

fn benchmark_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("stripe_reorder");

    // A full stripe of a 2550-pixel color line with a 24-line head offset.
    let bytes_per_line = 2550 * 3;
    let line_difference = 24;
    let out_lines = 2 * line_difference - line_difference;
    let stripe = generate_stripe(2 * line_difference, bytes_per_line);

    group.bench_function("color_pack", |b| {
        let mut out = Vec::with_capacity(out_lines * bytes_per_line);
        b.iter(|| {
            out.clear();
            color_pack(
                black_box(&stripe),
                bytes_per_line,
                line_difference,
                out_lines,
                &mut out,
            );
        });
    });

    group.bench_function("line_pack", |b| {
        let mut out = Vec::with_capacity(out_lines * bytes_per_line);
        b.iter(|| {
            out.clear();
            line_pack(black_box(&stripe), bytes_per_line, out_lines, 1, &mut out);
        });
    });

    group.finish();
}

fn benchmark_gamma_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("gamma_build");
    let curves = GammaCurves::identity();

    let generations = vec![
        (AsicGeneration::Gen1, "gen1"),
        (AsicGeneration::Gen3, "gen3"),
        (AsicGeneration::Gen4, "gen4"),
    ];

    for (asic, label) in generations {
        group.bench_with_input(BenchmarkId::from_parameter(label), &asic, |b, &asic| {
            b.iter(|| build_gamma(ColorMode::Color, asic, black_box(0.1), black_box(0.2), &curves));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_reduction_widths,
    benchmark_reduction_line_counts,
    benchmark_reorder,
    benchmark_gamma_build
);
criterion_main!(benches);
