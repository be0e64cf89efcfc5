use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use chart2png::{render_figure, Config, Figure};

fn chart(points: usize) -> String {
    let xs: Vec<String> = (0..points).map(|i| i.to_string()).collect();
    let ys: Vec<String> = (0..points)
        .map(|i| format!("{:.3}", (i as f64 / 10.0).sin()))
        .collect();
    format!(
        r#"<script>Plotly.newPlot("bench", [{{"type":"scatter","x":[{x}],"y":[{y}]}},{{"type":"bar","x":[{x}],"y":[{y}]}}], {{"title":{{"text":"bench"}}}})</script>"#,
        x = xs.join(","),
        y = ys.join(",")
    )
}

fn sizes() -> Vec<(&'static str, usize)> {
    vec![("small", 10), ("medium", 200), ("large", 2000)]
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");

    for (name, points) in sizes() {
        let html = chart(points);
        group.throughput(Throughput::Bytes(html.len() as u64));

        group.bench_with_input(BenchmarkId::new("from_html", name), &html, |b, html| {
            b.iter(|| Figure::from_html(black_box(html)).unwrap());
        });
    }

    group.finish();
}

fn bench_svg(c: &mut Criterion) {
    let mut group = c.benchmark_group("svg");

    for (name, points) in sizes() {
        let figure = Figure::from_html(&chart(points)).unwrap();
        group.throughput(Throughput::Elements(points as u64));

        group.bench_with_input(BenchmarkId::new("to_svg", name), &figure, |b, figure| {
            b.iter(|| black_box(figure).to_svg(1200, 800));
        });
        group.bench_with_input(BenchmarkId::new("to_html", name), &figure, |b, figure| {
            b.iter(|| black_box(figure).to_html(1200, 800));
        });
    }

    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");
    let figure = Figure::from_html(&chart(200)).unwrap();

    for scale in [1.0, 2.0] {
        group.bench_with_input(
            BenchmarkId::new("png", format!("{scale}x")),
            &scale,
            |b, &scale| {
                b.iter(|| render_figure(black_box(&figure), &Config::new().scale(scale)).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_extract, bench_svg, bench_scaling);
criterion_main!(benches);
