use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use embedding_explorer::clustering::{evaluate_clustering, silhouette_score};
use embedding_explorer::projection::{Projector, ReductionMethod};

/// `n` points spread over five noisy centers in `dim` dimensions.
fn corpus(n: usize, dim: usize) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(7);
    let centers: Vec<Vec<f32>> = (0..5)
        .map(|_| (0..dim).map(|_| rng.gen_range(-4.0..4.0)).collect())
        .collect();

    Array2::from_shape_fn((n, dim), |(i, d)| {
        centers[i % centers.len()][d] + rng.gen_range(-0.5..0.5)
    })
}

fn bench_kmeans_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans_corpus_size");
    group.sample_size(20);

    for n in [50, 200, 800] {
        let data = corpus(n, 64);
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| evaluate_clustering(black_box(data), 5))
        });
    }
    group.finish();
}

fn bench_kmeans_k(c: &mut Criterion) {
    let data = corpus(300, 64);
    let mut group = c.benchmark_group("kmeans_cluster_count");
    group.sample_size(20);

    for k in [2, 5, 10, 20] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| evaluate_clustering(black_box(&data), k))
        });
    }
    group.finish();
}

fn bench_silhouette(c: &mut Criterion) {
    let data = corpus(500, 64).mapv(f64::from);
    let labels: Vec<usize> = (0..data.nrows()).map(|i| i % 5).collect();

    c.bench_function("silhouette_500", |b| {
        b.iter(|| silhouette_score(black_box(&data), black_box(&labels)))
    });
}

fn bench_projection(c: &mut Criterion) {
    let data = corpus(200, 64);
    let mut group = c.benchmark_group("projection_200");
    group.sample_size(10);

    for method in [ReductionMethod::Pca, ReductionMethod::Umap] {
        let projector = Projector::with_method(method);
        group.bench_function(method.name(), |b| {
            b.iter(|| projector.project(black_box(&data)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_kmeans_sizes,
    bench_kmeans_k,
    bench_silhouette,
    bench_projection
);
criterion_main!(benches);
