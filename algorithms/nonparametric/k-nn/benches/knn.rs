use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use k_nn::KnnClassifier;
use kickform_helpers::{DataPoint, L2Dist};
use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

// 33 landmarks flattened to (x, y) pairs.
const DIM: usize = 66;

fn random_point(rng: &mut Xoshiro256PlusPlus) -> Array1<f64> {
    Array1::from_iter((0..DIM).map(|_| rng.random_range(0.0..1.0)))
}

fn trained(n: usize, rng: &mut Xoshiro256PlusPlus) -> KnnClassifier<usize, f64, L2Dist> {
    let data = (0..n)
        .map(|i| DataPoint::new(random_point(rng), i % 6))
        .collect();
    KnnClassifier::with_training_data(5, data, L2Dist).unwrap()
}

fn bench_learn(c: &mut Criterion) {
    let mut group = c.benchmark_group("learn");
    for n in [10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
            let base = trained(n, &mut rng);
            let point = random_point(&mut rng);
            b.iter(|| {
                let mut classifier = base.clone();
                classifier.learn(black_box(point.clone()), 0).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    for n in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
            let classifier = trained(n, &mut rng);
            let query = random_point(&mut rng);
            b.iter(|| classifier.classify(black_box(query.view())).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_learn, bench_classify);
criterion_main!(benches);
