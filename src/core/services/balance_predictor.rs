//! End-of-month spend estimation from partial month data.
//!
//! The estimate is the spend observed so far plus the median of what other
//! months still spent after the same day of the month. Everything here is
//! pure and total: missing data yields `None` or a neutral result.

use std::{cmp::Ordering, collections::BTreeMap};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{
    core::normalizer::finite_or_zero,
    ledger::{month_key, month_length, BudgetMonth},
};

/// How far either side of the observation day to look for history.
const MAX_SEARCH_OFFSET: u32 = 31;

/// day of month -> remainders (final spend minus spend up to that day)
/// collected across historical months.
pub type RemainderHistogram = BTreeMap<u32, Vec<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancePrediction {
    pub predicted_spend: f64,
    pub predicted_leftover: f64,
    pub spent_so_far: f64,
    pub incomes_total: f64,
    pub observation_day: u32,
    /// Histogram day whose median was used, `None` without history.
    pub remainder_used_day: Option<u32>,
    pub sample_size: usize,
}

/// Remainder chosen from the histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemainderPick {
    pub remainder: f64,
    pub source_day: Option<u32>,
    pub sample_size: usize,
}

impl RemainderPick {
    fn none() -> Self {
        Self {
            remainder: 0.0,
            source_day: None,
            sample_size: 0,
        }
    }

    fn from_bucket(day: u32, bucket: &[f64]) -> Option<Self> {
        Some(Self {
            remainder: median(bucket)?,
            source_day: Some(day),
            sample_size: bucket.len(),
        })
    }
}

pub struct BalancePredictor;

impl BalancePredictor {
    /// Predicts final spend and leftover for `target` as seen on
    /// `reference_date`. Returns `None` when `target` is not in `months` or
    /// is not a valid month key.
    pub fn predict(
        target: &str,
        months: &BTreeMap<String, BudgetMonth>,
        reference_date: NaiveDate,
    ) -> Option<BalancePrediction> {
        let month = months.get(target)?;
        let length = month_length(target)?;
        let today_key = month_key(reference_date);

        let observation_day = match target.cmp(today_key.as_str()) {
            Ordering::Less => length,
            Ordering::Equal => {
                let capped = reference_date.day().min(length);
                latest_transaction_day(month, length).map_or(capped, |day| day.max(capped))
            }
            Ordering::Greater => latest_transaction_day(month, length).unwrap_or(0),
        };

        let cumulative = cumulative_spend(month, length);
        let spent_so_far = cumulative[observation_day.min(length) as usize];
        let incomes_total = month.income_total();

        let histogram = remainder_histogram(months, target);
        let pick = pick_remainder(&histogram, observation_day);

        let predicted_spend = (spent_so_far + pick.remainder).max(0.0);
        Some(BalancePrediction {
            predicted_spend,
            predicted_leftover: incomes_total - predicted_spend,
            spent_so_far,
            incomes_total,
            observation_day,
            remainder_used_day: pick.source_day,
            sample_size: pick.sample_size,
        })
    }
}

/// Signed spend accumulated by the end of each day; index 0 is the start of
/// the month, so the vector has `length + 1` entries. Transactions without a
/// usable day inside the month are ignored.
pub fn cumulative_spend(month: &BudgetMonth, length: u32) -> Vec<f64> {
    let mut daily = vec![0.0; length as usize + 1];
    for txn in &month.transactions {
        if let Some(day) = txn.day_of_month().filter(|day| (1..=length).contains(day)) {
            daily[day as usize] += finite_or_zero(txn.amount);
        }
    }
    let mut running = 0.0;
    for slot in daily.iter_mut() {
        running += *slot;
        *slot = running;
    }
    daily
}

/// Builds the remainder histogram from every month except `exclude`.
pub fn remainder_histogram(
    months: &BTreeMap<String, BudgetMonth>,
    exclude: &str,
) -> RemainderHistogram {
    let mut histogram = RemainderHistogram::new();
    for (key, month) in months {
        if key == exclude {
            continue;
        }
        let Some(length) = month_length(key) else {
            continue;
        };
        let cumulative = cumulative_spend(month, length);
        let final_spend = cumulative[length as usize];
        for (day, spent) in cumulative.iter().enumerate() {
            histogram
                .entry(day as u32)
                .or_default()
                .push(final_spend - spent);
        }
    }
    histogram
}

/// Chooses the remainder for `observation_day`: the exact bucket if it has
/// samples, otherwise the nearest bucket (earlier day before later day at
/// each distance), otherwise the latest day present.
pub fn pick_remainder(histogram: &RemainderHistogram, observation_day: u32) -> RemainderPick {
    let bucket_at = |day: u32| {
        histogram
            .get(&day)
            .filter(|bucket| !bucket.is_empty())
            .and_then(|bucket| RemainderPick::from_bucket(day, bucket))
    };

    if let Some(pick) = bucket_at(observation_day) {
        return pick;
    }
    for offset in 1..=MAX_SEARCH_OFFSET {
        let earlier = observation_day.checked_sub(offset).and_then(bucket_at);
        if let Some(pick) = earlier {
            return pick;
        }
        if let Some(pick) = bucket_at(observation_day + offset) {
            return pick;
        }
    }
    histogram
        .iter()
        .rev()
        .find_map(|(day, bucket)| RemainderPick::from_bucket(*day, bucket))
        .unwrap_or_else(RemainderPick::none)
}

/// Sorted middle value; the mean of the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn latest_transaction_day(month: &BudgetMonth, length: u32) -> Option<u32> {
    month
        .transactions
        .iter()
        .filter_map(|txn| txn.day_of_month())
        .filter(|day| (1..=length).contains(day))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Income, Transaction};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(key: &str, income: f64, spends: &[(u32, f64)]) -> BudgetMonth {
        let mut month = BudgetMonth::default();
        month.incomes.push(Income::new("Salary", income));
        for (day, amount) in spends {
            month.transactions.push(Transaction {
                id: format!("{key}-{day}"),
                date: format!("{key}-{day:02}"),
                desc: "spend".into(),
                amount: *amount,
                category: String::new(),
            });
        }
        month
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected:.2}, got {actual:.2}"
        );
    }

    #[test]
    fn unknown_target_has_no_prediction() {
        let months = BTreeMap::from([("2024-01".to_string(), BudgetMonth::default())]);
        assert!(BalancePredictor::predict("2024-02", &months, date(2024, 2, 1)).is_none());
        let bad = BTreeMap::from([("someday".to_string(), BudgetMonth::default())]);
        assert!(BalancePredictor::predict("someday", &bad, date(2024, 2, 1)).is_none());
    }

    #[test]
    fn no_history_means_zero_remainder() {
        let months = BTreeMap::from([(
            "2024-03".to_string(),
            month("2024-03", 1000.0, &[(2, 40.0), (9, 60.0)]),
        )]);
        let prediction = BalancePredictor::predict("2024-03", &months, date(2024, 3, 12)).unwrap();
        assert_eq!(prediction.observation_day, 12);
        assert_eq!(prediction.sample_size, 0);
        assert_eq!(prediction.remainder_used_day, None);
        assert_close(prediction.spent_so_far, 100.0);
        assert_close(prediction.predicted_spend, 100.0);
        assert_close(prediction.predicted_leftover, 900.0);
    }

    #[test]
    fn exact_bucket_median_for_odd_and_even_sizes() {
        let odd = RemainderHistogram::from([(10, vec![30.0, 10.0, 20.0]), (9, vec![999.0])]);
        let pick = pick_remainder(&odd, 10);
        assert_eq!(pick.source_day, Some(10));
        assert_eq!(pick.sample_size, 3);
        assert_close(pick.remainder, 20.0);

        let even = RemainderHistogram::from([(10, vec![40.0, 10.0, 20.0, 30.0])]);
        let pick = pick_remainder(&even, 10);
        assert_eq!(pick.sample_size, 4);
        assert_close(pick.remainder, 25.0);
    }

    #[test]
    fn earlier_day_wins_at_equal_distance() {
        let histogram = RemainderHistogram::from([(9, vec![5.0]), (11, vec![50.0])]);
        let pick = pick_remainder(&histogram, 10);
        assert_eq!(pick.source_day, Some(9));
        assert_close(pick.remainder, 5.0);

        let histogram = RemainderHistogram::from([(8, vec![5.0]), (11, vec![50.0])]);
        assert_eq!(pick_remainder(&histogram, 10).source_day, Some(11));
    }

    #[test]
    fn day_zero_never_searches_negative_days() {
        let histogram = RemainderHistogram::from([(1, vec![7.0])]);
        let pick = pick_remainder(&histogram, 0);
        assert_eq!(pick.source_day, Some(1));
    }

    #[test]
    fn out_of_range_history_uses_latest_day() {
        let histogram = RemainderHistogram::from([(80, vec![1.0]), (100, vec![5.0, 7.0])]);
        let pick = pick_remainder(&histogram, 10);
        assert_eq!(pick.source_day, Some(100));
        assert_close(pick.remainder, 6.0);
        assert_eq!(pick_remainder(&RemainderHistogram::new(), 10), RemainderPick::none());
    }

    #[test]
    fn cumulative_curve_is_signed_and_skips_bad_days() {
        let mut m = month("2024-02", 0.0, &[(1, 10.0), (3, -4.0), (29, 5.0)]);
        m.transactions.push(Transaction {
            date: "not a date".into(),
            amount: 1000.0,
            ..Transaction::default()
        });
        let curve = cumulative_spend(&m, 29);
        assert_eq!(curve.len(), 30);
        assert_close(curve[0], 0.0);
        assert_close(curve[2], 10.0);
        assert_close(curve[3], 6.0);
        assert_close(curve[29], 11.0);
    }

    #[test]
    fn current_month_observes_future_dated_transactions() {
        let months = BTreeMap::from([(
            "2024-04".to_string(),
            month("2024-04", 500.0, &[(3, 20.0), (18, 30.0)]),
        )]);
        let prediction = BalancePredictor::predict("2024-04", &months, date(2024, 4, 10)).unwrap();
        assert_eq!(prediction.observation_day, 18);
        assert_close(prediction.spent_so_far, 50.0);
    }

    #[test]
    fn predicted_spend_is_never_negative() {
        let months = BTreeMap::from([
            ("2024-01".to_string(), month("2024-01", 100.0, &[(2, -300.0)])),
            ("2024-02".to_string(), month("2024-02", 100.0, &[(20, -50.0)])),
        ]);
        let prediction = BalancePredictor::predict("2024-01", &months, date(2024, 1, 5)).unwrap();
        assert_close(prediction.predicted_spend, 0.0);
        assert_close(prediction.predicted_leftover, 100.0);
    }
}
