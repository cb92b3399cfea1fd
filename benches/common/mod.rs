#![allow(dead_code)]

use criterion::{BenchmarkId, Criterion, black_box};
use llamma_swap_math::math::band_math::BandInvariant;
use llamma_swap_math::math::exp_math::{ln_int, wad_exp};
use llamma_swap_math::math::fee_math::get_dynamic_fee;
use llamma_swap_math::math::price_math::{log_a_ratio, p_oracle_up};
use llamma_swap_math::{I256, LlammaPool, U256};
use std::str::FromStr;

pub const DYNAMIC_FEE_POOL: &str = include_str!("../../tests/assets/llamma_a100_dynamic_fee.json");
pub const USDC_POOL: &str = include_str!("../../tests/assets/llamma_a50_usdc.json");

fn u(s: &str) -> U256 {
    U256::from_str(s).unwrap()
}

fn i(s: &str) -> I256 {
    I256::from_str(s).unwrap()
}

pub fn bench_exp_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("exp_math");
    for x in ["0", "1000000000000000000", "-41000000000000000000", "135000000000000000000"] {
        let x = i(x);
        group.bench_with_input(BenchmarkId::new("wad_exp", x), &x, |b, &x| {
            b.iter(|| wad_exp(black_box(x)))
        });
    }
    for x in ["1010101010101010101", "2000000000000000000", "3000000000000000000000"] {
        let x = u(x);
        group.bench_with_input(BenchmarkId::new("ln_int", x), &x, |b, &x| {
            b.iter(|| ln_int(black_box(x)))
        });
    }
    group.finish();
}

pub fn bench_price_math(c: &mut Criterion) {
    let a = U256::from(100u8);
    let a_minus_1 = U256::from(99u8);
    let base = u("2500000000000000000000");
    let log_ratio = log_a_ratio(a, a_minus_1).unwrap();

    let mut group = c.benchmark_group("price_math");
    group.bench_function("log_a_ratio", |b| {
        b.iter(|| log_a_ratio(black_box(a), black_box(a_minus_1)))
    });
    for n in [0i64, 25, -300] {
        group.bench_with_input(BenchmarkId::new("p_oracle_up", n), &n, |b, &n| {
            b.iter(|| p_oracle_up(black_box(base), black_box(log_ratio), black_box(n)))
        });
    }
    let p_o_up = p_oracle_up(base, log_ratio, 4).unwrap();
    group.bench_function("get_dynamic_fee", |b| {
        b.iter(|| get_dynamic_fee(black_box(base), black_box(p_o_up), a, a_minus_1))
    });
    group.finish();
}

pub fn bench_band_math(c: &mut Criterion) {
    let a = U256::from(100u8);
    let a_minus_1 = U256::from(99u8);
    let p_o = u("2500000000000000000000");
    let p_o_up = u("2500000000000000000000");
    let x = u("10000000000000000000000");
    let y = u("6000000000000000000");

    c.bench_function("band_invariant", |b| {
        b.iter(|| {
            BandInvariant::compute(
                black_box(x),
                black_box(y),
                black_box(p_o),
                black_box(p_o_up),
                a,
                a_minus_1,
            )
        })
    });
}

pub fn bench_quotes(c: &mut Criterion) {
    let pool = LlammaPool::from_json(DYNAMIC_FEE_POOL).unwrap();
    let [borrowed, collateral] = pool.token_addresses();

    let mut group = c.benchmark_group("quote_exact_input");
    for amount in ["10000000000000", "50000000000000000000000", "1000000000000000000000000000000"] {
        let amount = u(amount);
        group.bench_with_input(BenchmarkId::new("borrowed_in", amount), &amount, |b, &amount| {
            b.iter(|| pool.quote_exact_input(borrowed, black_box(amount), collateral))
        });
    }
    for amount in ["10000000000000", "10000000000000000000"] {
        let amount = u(amount);
        group.bench_with_input(BenchmarkId::new("collateral_in", amount), &amount, |b, &amount| {
            b.iter(|| pool.quote_exact_input(collateral, black_box(amount), borrowed))
        });
    }
    group.finish();

    c.bench_function("quote_exact_output", |b| {
        b.iter(|| pool.quote_exact_output(borrowed, black_box(u("5000000000000000000")), collateral))
    });

    let usdc_pool = LlammaPool::from_json(USDC_POOL).unwrap();
    let [usdc, wsteth] = usdc_pool.token_addresses();
    c.bench_function("drain_ten_bands", |b| {
        b.iter(|| usdc_pool.quote_exact_input(usdc, black_box(U256::from(10u64).pow(U256::from(25u8))), wsteth))
    });
}

pub fn bench_commit(c: &mut Criterion) {
    let pool = LlammaPool::from_json(DYNAMIC_FEE_POOL).unwrap();
    let [borrowed, collateral] = pool.token_addresses();
    let quote = pool
        .quote_exact_input(borrowed, u("50000000000000000000000"), collateral)
        .unwrap();

    c.bench_function("commit_three_bands", |b| {
        b.iter_batched(
            || pool.clone(),
            |mut pool| pool.commit(black_box(&quote.trade)),
            criterion::BatchSize::SmallInput,
        )
    });
}

pub fn bench_snapshot(c: &mut Criterion) {
    c.bench_function("pool_from_json", |b| {
        b.iter(|| LlammaPool::from_json(black_box(DYNAMIC_FEE_POOL)))
    });
}
