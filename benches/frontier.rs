use std::hint::black_box;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use ndarray::Array2;
use ndarray_rand::RandomExt;
use quant_engine::quant::portfolio::PortfolioEngine;
use quant_engine::quant::portfolio::ReturnsMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Normal;

/// Independent daily returns with increasing drift and volatility per asset.
fn returns(periods: usize, assets: usize) -> ReturnsMatrix {
  let mut rng = StdRng::seed_from_u64(42);
  let normal = Normal::new(0.0, 1.0).unwrap();
  let noise = Array2::<f64>::random_using((periods, assets), normal, &mut rng);
  let values = Array2::from_shape_fn((periods, assets), |(t, i)| {
    let scale = 1.0 + i as f64 / assets as f64;
    0.0004 * scale + 0.01 * scale * noise[[t, i]]
  });
  let tickers = (0..assets).map(|i| format!("A{i:03}")).collect();
  ReturnsMatrix::new(vec![], tickers, values).unwrap()
}

fn bench_optimize(c: &mut Criterion) {
  let mut group = c.benchmark_group("Frontier");
  group.sample_size(20);
  let engine = PortfolioEngine::default();

  for &assets in &[5, 20, 50] {
    let data = returns(750, assets);
    group.bench_with_input(BenchmarkId::new("short_selling", assets), &data, |b, data| {
      b.iter(|| black_box(engine.optimize(data, true, 0.02).unwrap()))
    });
    group.bench_with_input(BenchmarkId::new("long_only", assets), &data, |b, data| {
      b.iter(|| black_box(engine.optimize(data, false, 0.0).unwrap()))
    });
  }

  group.finish();
}

criterion_group!(benches, bench_optimize);
criterion_main!(benches);
