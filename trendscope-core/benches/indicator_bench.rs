//! Indicator primitive benchmarks over a 2000-bar series.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use trendscope_core::domain::Bar;
use trendscope_core::indicators::{Adx, Donchian, Indicator, Rsi, Sma};

fn bench_bars(n: usize) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2018, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            // Deterministic wobble around a slow drift
            let close = 100.0 + (i as f64) * 0.05 + ((i * 7919) % 100) as f64 * 0.1;
            Bar {
                date: base + chrono::Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.5,
                close,
                volume: 10_000,
            }
        })
        .collect()
}

fn indicator_benches(c: &mut Criterion) {
    let bars = bench_bars(2000);

    c.bench_function("sma_50_2000_bars", |b| {
        let sma = Sma::new(50);
        b.iter(|| black_box(sma.compute(black_box(&bars))));
    });

    c.bench_function("rsi_14_2000_bars", |b| {
        let rsi = Rsi::new(14);
        b.iter(|| black_box(rsi.compute(black_box(&bars))));
    });

    c.bench_function("adx_14_2000_bars", |b| {
        let adx = Adx::strength(14);
        b.iter(|| black_box(adx.compute(black_box(&bars))));
    });

    c.bench_function("donchian_200_2000_bars", |b| {
        let chan = Donchian::upper(200);
        b.iter(|| black_box(chan.compute(black_box(&bars))));
    });
}

criterion_group!(benches, indicator_benches);
criterion_main!(benches);
