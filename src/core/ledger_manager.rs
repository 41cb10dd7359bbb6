use std::{io::Read, path::Path, sync::Arc};

use tracing::info;

use crate::{
    config::Config,
    core::{
        services::{
            BalancePrediction, BalancePredictor, CategoryPredictor, DescriptionPredictor,
            MonthService,
        },
        Clock, StateStore, SystemClock,
    },
    errors::Result,
    ledger::{month_key, BudgetState},
    storage::{JsonSnapshotStorage, MemoryStorage, SnapshotStorage},
    transfer::{self, CsvImportReport, TransferKind},
};

/// Composition root: one store and the services bound to it.
#[derive(Clone)]
pub struct LedgerManager {
    store: Arc<StateStore>,
    clock: Arc<dyn Clock>,
    categories: CategoryPredictor,
    descriptions: DescriptionPredictor,
    months: MonthService,
}

impl LedgerManager {
    pub fn new(
        storage: Arc<dyn SnapshotStorage>,
        clock: Arc<dyn Clock>,
        suggestion_limit: usize,
    ) -> Self {
        let store = Arc::new(StateStore::new(storage));
        Self {
            categories: CategoryPredictor::new(Arc::clone(&store)),
            descriptions: DescriptionPredictor::with_limit(Arc::clone(&store), suggestion_limit),
            months: MonthService::new(Arc::clone(&store), Arc::clone(&clock)),
            store,
            clock,
        }
    }

    /// Ledger backed by the JSON snapshot that `config` points at.
    pub fn open(config: &Config, base_dir: &Path) -> Self {
        let path = config.snapshot_path(base_dir);
        info!(path = %path.display(), "opening ledger");
        Self::new(
            Arc::new(JsonSnapshotStorage::new(path)),
            Arc::new(SystemClock),
            config.suggestion_limit,
        )
    }

    /// Throwaway ledger kept in memory.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            clock,
            Config::default().suggestion_limit,
        )
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<BudgetState> {
        self.store.current_snapshot()
    }

    pub fn categories(&self) -> &CategoryPredictor {
        &self.categories
    }

    pub fn descriptions(&self) -> &DescriptionPredictor {
        &self.descriptions
    }

    pub fn months(&self) -> &MonthService {
        &self.months
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Month key of today's date.
    pub fn current_month(&self) -> String {
        month_key(self.clock.today())
    }

    /// Balance prediction for `month` as of today.
    pub fn predict_balance(&self, month: &str) -> Option<BalancePrediction> {
        BalancePredictor::predict(month, &self.snapshot().months, self.clock.today())
    }

    /// Category suggestion for `desc` among the categories of `month`.
    pub fn predict_category(&self, month: &str, desc: &str, amount: Option<f64>) -> Option<String> {
        let known = self.snapshot().category_names(month);
        self.categories.predict(desc, &known, amount)
    }

    pub fn export(&self, kind: TransferKind, month: Option<&str>) -> Result<String> {
        transfer::export(&self.snapshot(), kind, month)
    }

    pub fn import_json(&self, json: &str, month: Option<&str>) -> Result<Arc<BudgetState>> {
        transfer::import_json(&self.store, json, month)
    }

    pub fn import_csv<R: Read>(&self, reader: R) -> Result<CsvImportReport> {
        transfer::import_csv(&self.store, reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FixedClock;
    use chrono::NaiveDate;

    fn manager() -> LedgerManager {
        let today = NaiveDate::from_ymd_opt(2024, 7, 20).unwrap();
        LedgerManager::in_memory(Arc::new(FixedClock::on(today)))
    }

    #[test]
    fn services_share_one_store() {
        let ledger = manager();
        assert_eq!(ledger.current_month(), "2024-07");
        ledger
            .months()
            .set_category("2024-07", "Food", "Living", 200.0)
            .unwrap();
        ledger.categories().learn("Tesco", "Food", None).unwrap();

        assert_eq!(
            ledger.predict_category("2024-07", "tesco", None).as_deref(),
            Some("Food")
        );
        assert_eq!(ledger.predict_category("2024-06", "tesco", None), None);
        assert_eq!(ledger.descriptions().suggest("te"), vec!["Tesco".to_string()]);
    }

    #[test]
    fn balance_prediction_uses_the_clock() {
        let ledger = manager();
        ledger.months().add_income("2024-07", "Salary", 1000.0).unwrap();
        let prediction = ledger.predict_balance("2024-07").unwrap();
        assert_eq!(prediction.observation_day, 20);
        assert_eq!(prediction.predicted_leftover, 1000.0);
        assert!(ledger.predict_balance("2024-08").is_none());
    }
}
