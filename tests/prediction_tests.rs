mod common;

use common::{date, json_ledger, seed_month, seed_reference_history};

#[test]
fn current_month_uses_median_remainder_of_other_months() {
    let (ledger, _) = json_ledger(date(2024, 4, 15));
    seed_reference_history(&ledger);

    let prediction = ledger.predict_balance("2024-04").unwrap();
    assert_eq!(prediction.observation_day, 15);
    assert_eq!(prediction.spent_so_far, 300.0);
    assert_eq!(prediction.predicted_spend, 600.0);
    assert_eq!(prediction.predicted_leftover, 1400.0);
    assert_eq!(prediction.remainder_used_day, Some(15));
    assert_eq!(prediction.sample_size, 5);
}

#[test]
fn elapsed_month_is_observed_to_its_last_day() {
    let (ledger, _) = json_ledger(date(2024, 4, 15));
    seed_reference_history(&ledger);

    let prediction = ledger.predict_balance("2024-02").unwrap();
    assert_eq!(prediction.observation_day, 29);
    assert_eq!(prediction.predicted_spend, 600.0);
    assert_eq!(prediction.predicted_leftover, 1450.0);
    assert_eq!(prediction.remainder_used_day, Some(29));
}

#[test]
fn future_month_without_spending_predicts_typical_total() {
    let (ledger, _) = json_ledger(date(2024, 4, 15));
    seed_reference_history(&ledger);
    seed_month(&ledger, "2024-07", 2000.0, &[]);

    let prediction = ledger.predict_balance("2024-07").unwrap();
    assert_eq!(prediction.observation_day, 0);
    assert_eq!(prediction.predicted_spend, 480.0);
    assert_eq!(prediction.predicted_leftover, 1520.0);
    assert_eq!(prediction.sample_size, 6);
}

#[test]
fn category_learning_follows_booked_transactions() {
    let (ledger, _) = json_ledger(date(2024, 4, 15));
    ledger
        .months()
        .set_category("2024-04", "Transport", "Travel", 60.0)
        .unwrap();
    ledger
        .months()
        .set_category("2024-04", "Food", "Living", 200.0)
        .unwrap();
    ledger.categories().learn("Uber trip", "Transport", Some(12.0)).unwrap();
    ledger.categories().learn("Uber Eats", "Food", None).unwrap();
    ledger.categories().learn("Uber Eats order", "Food", None).unwrap();

    assert_eq!(
        ledger.predict_category("2024-04", "uber trip", Some(12.0)).as_deref(),
        Some("Transport")
    );
    // Token scores: uber -> Transport 1, Food 2.
    assert_eq!(
        ledger.predict_category("2024-04", "Uber", None).as_deref(),
        Some("Food")
    );
    assert_eq!(
        ledger.descriptions().suggest("uber"),
        vec!["Uber trip", "Uber Eats", "Uber Eats order"]
    );
}
