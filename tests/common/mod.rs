#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, sync::Mutex};

use budget_ledger::{
    core::{FixedClock, LedgerManager},
    ledger::Transaction,
    storage::JsonSnapshotStorage,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Fresh directory that outlives the calling test.
pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Ledger persisted to `budget.json` in its own directory, with the clock
/// pinned to `today`.
pub fn json_ledger(today: NaiveDate) -> (LedgerManager, PathBuf) {
    let path = temp_dir().join("budget.json");
    (ledger_at(&path, today), path)
}

pub fn ledger_at(path: &PathBuf, today: NaiveDate) -> LedgerManager {
    LedgerManager::new(
        Arc::new(JsonSnapshotStorage::new(path.clone())),
        Arc::new(FixedClock::on(today)),
        4,
    )
}

/// Books one income line and dated spends into `key`.
pub fn seed_month(ledger: &LedgerManager, key: &str, income: f64, spends: &[(u32, f64)]) {
    ledger
        .months()
        .add_income(key, "Salary", income)
        .expect("add income");
    for (day, amount) in spends {
        let mut txn = Transaction::default();
        txn.date = format!("{key}-{day:02}");
        txn.desc = "Groceries".into();
        txn.amount = *amount;
        ledger.months().add_transaction(txn).expect("add transaction");
    }
}

/// Six months of 2024 history used by the prediction tests.
pub fn seed_reference_history(ledger: &LedgerManager) {
    seed_month(ledger, "2024-01", 2000.0, &[(3, 120.0), (12, 180.0), (22, 250.0)]);
    seed_month(ledger, "2024-02", 2050.0, &[(5, 100.0), (10, 200.0), (20, 300.0)]);
    seed_month(
        ledger,
        "2024-03",
        2100.0,
        &[(1, 50.0), (14, 150.0), (16, 200.0), (28, 100.0)],
    );
    seed_month(ledger, "2024-04", 2000.0, &[(2, 100.0), (9, 150.0), (15, 50.0)]);
    seed_month(ledger, "2024-05", 2000.0, &[(7, 80.0), (18, 150.0), (25, 200.0)]);
    seed_month(ledger, "2024-06", 2100.0, &[(4, 60.0), (19, 400.0)]);
}
