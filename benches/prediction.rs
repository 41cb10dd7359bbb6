//! Criterion benchmarks for the prediction hot paths.

use std::collections::BTreeMap;

use budget_ledger::{
    core::{
        normalize,
        services::{category_predictor, BalancePredictor},
    },
    ledger::{BudgetMonth, BudgetState, Income, Transaction},
};
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn history(months: u32) -> BTreeMap<String, BudgetMonth> {
    (0..months)
        .map(|index| {
            let key = format!("{}-{:02}", 2015 + index / 12, index % 12 + 1);
            let mut month = BudgetMonth::default();
            month.incomes.push(Income::new("Salary", 2000.0));
            for day in 1..=28u32 {
                month.transactions.push(Transaction {
                    id: format!("{key}-{day}"),
                    date: format!("{key}-{day:02}"),
                    desc: format!("Shop {}", day % 7),
                    amount: f64::from(day * 3 + index % 5),
                    category: format!("Cat {}", day % 4),
                });
            }
            (key, month)
        })
        .collect()
}

fn state(months: u32) -> BudgetState {
    let mut state = BudgetState {
        months: history(months),
        ..BudgetState::default()
    };
    let transactions: Vec<Transaction> = state
        .months
        .values()
        .flat_map(|month| month.transactions.clone())
        .collect();
    for txn in &transactions {
        category_predictor::record_into(&mut state, txn);
    }
    state
}

fn bench_balance_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance_predictor/predict");
    let reference = NaiveDate::from_ymd_opt(2016, 6, 15).expect("valid date");
    for months in [12u32, 60, 120] {
        let months_map = history(months);
        group.bench_with_input(BenchmarkId::from_parameter(months), &months_map, |b, map| {
            b.iter(|| BalancePredictor::predict(black_box("2016-06"), black_box(map), reference))
        });
    }
    group.finish();
}

fn bench_category_prediction(c: &mut Criterion) {
    let state = state(60);
    let known = ["Cat 0", "Cat 1", "Cat 2", "Cat 3"];
    c.bench_function("category_predictor/predict_in", |b| {
        b.iter(|| {
            category_predictor::predict_in(
                black_box(&state.mapping),
                black_box("shop 3 express"),
                &known,
                None,
            )
        })
    });
}

fn bench_normalize(c: &mut Criterion) {
    let state = state(60);
    c.bench_function("normalizer/normalize", |b| {
        b.iter(|| normalize(black_box(state.clone())))
    });
}

criterion_group!(
    benches,
    bench_balance_prediction,
    bench_category_prediction,
    bench_normalize
);
criterion_main!(benches);
