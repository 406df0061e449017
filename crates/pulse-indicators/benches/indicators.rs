//! Benchmarks for indicator implementations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pulse_core::traits::Indicator;
use pulse_core::types::{Bar, PriceSeries, Symbol, Timeframe};
use pulse_indicators::{IndicatorEngine, LogReturnVolatility, Rsi};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn generate_series(size: usize) -> PriceSeries {
    let step = Timeframe::Hour4.as_millis() as i64;
    let bars = generate_test_data(size)
        .into_iter()
        .enumerate()
        .map(|(i, c)| Bar::new(i as i64 * step, c, c + 1.0, c - 1.0, c, 1_000.0))
        .collect();
    PriceSeries::new(Symbol::new("BTC", "USDT"), Timeframe::Hour4, bars)
        .expect("generated bars are regular")
}

fn benchmark_rsi(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSI");

    for size in [168, 1000, 10000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("wilder", size), &data, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_volatility(c: &mut Criterion) {
    let mut group = c.benchmark_group("Volatility");

    for size in [168, 1000, 10000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("log_returns", size), &data, |b, data| {
            let vol = LogReturnVolatility::new(Timeframe::Hour4.periods_per_year());
            b.iter(|| vol.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("Engine");

    for size in [168, 1000].iter() {
        let series = generate_series(*size);

        group.bench_with_input(BenchmarkId::new("compute", size), &series, |b, series| {
            let engine = IndicatorEngine::default();
            b.iter(|| engine.compute(black_box(series)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_rsi, benchmark_volatility, benchmark_engine);
criterion_main!(benches);
