//! Ledger editing: months, transactions, incomes, categories and notes.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    core::{services::category_predictor, Clock, StateStore},
    errors::{LedgerError, Result},
    ledger::{parse_month_key, BudgetMonth, BudgetState, Category, Income, Note, Transaction},
};

/// Budget, spend and income figures for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthTotals {
    pub budgeted: f64,
    pub spent: f64,
    pub income: f64,
    pub leftover: f64,
}

impl MonthTotals {
    pub fn of(month: &BudgetMonth) -> Self {
        let income = month.income_total();
        let spent = month.spent_total();
        Self {
            budgeted: month.budget_total(),
            spent,
            income,
            leftover: income - spent,
        }
    }
}

/// Ledger editing operations. Each call is one store transform.
#[derive(Clone)]
pub struct MonthService {
    store: Arc<StateStore>,
    clock: Arc<dyn Clock>,
}

impl MonthService {
    pub fn new(store: Arc<StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn ensure_month(&self, key: &str) -> Result<BudgetMonth> {
        validate_month(key)?;
        if let Some(month) = self.store.current_snapshot().month(key) {
            return Ok(month.clone());
        }
        let snapshot = self.store.transform(|state| {
            state.ensure_month(key);
        })?;
        Ok(snapshot.month(key).cloned().unwrap_or_default())
    }

    /// Books `txn` into the month of its date and learns from it.
    pub fn add_transaction(&self, mut txn: Transaction) -> Result<Transaction> {
        let key = txn
            .month_key()
            .ok_or_else(|| LedgerError::InvalidInput(format!("invalid date `{}`", txn.date)))?;
        txn.ensure_id();
        let (_, booked) = self.store.try_transform(|state| {
            let month = state.ensure_month(&key);
            if month.transaction(&txn.id).is_some() {
                return Err(LedgerError::InvalidInput(format!(
                    "transaction `{}` already exists",
                    txn.id
                )));
            }
            month.transactions.push(txn.clone());
            category_predictor::record_into(state, &txn);
            Ok(txn)
        })?;
        Ok(booked)
    }

    pub fn remove_transaction(&self, month: &str, id: &str) -> Result<()> {
        self.edit_month(month, |entry| {
            let before = entry.transactions.len();
            entry.transactions.retain(|txn| txn.id != id);
            found(entry.transactions.len() < before, "transaction", id)
        })
    }

    pub fn add_income(&self, month: &str, name: &str, amount: f64) -> Result<Income> {
        validate_month(month)?;
        if name.trim().is_empty() {
            return Err(LedgerError::InvalidInput("income name is empty".into()));
        }
        let income = Income::new(name, amount);
        let (_, added) = self.store.try_transform(|state| {
            state.ensure_month(month).incomes.push(income.clone());
            Ok(income)
        })?;
        Ok(added)
    }

    pub fn remove_income(&self, month: &str, id: &str) -> Result<()> {
        self.edit_month(month, |entry| {
            let before = entry.incomes.len();
            entry.incomes.retain(|income| income.id != id);
            found(entry.incomes.len() < before, "income", id)
        })
    }

    /// Creates or replaces the category `name` in `month`.
    pub fn set_category(&self, month: &str, name: &str, group: &str, budget: f64) -> Result<()> {
        validate_month(month)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput("category name is empty".into()));
        }
        self.store.transform(|state| {
            state
                .ensure_month(month)
                .categories
                .insert(name.to_string(), Category::new(group, budget));
        })?;
        Ok(())
    }

    /// Removes the category. Transactions keep their category label.
    pub fn remove_category(&self, month: &str, name: &str) -> Result<()> {
        self.edit_month(month, |entry| {
            found(entry.categories.remove(name.trim()).is_some(), "category", name)
        })
    }

    pub fn set_collapsed(&self, month: &str, group: &str, collapsed: bool) -> Result<()> {
        validate_month(month)?;
        self.store.transform(|state| {
            let groups = state.ui.collapsed.entry(month.to_string()).or_default();
            if collapsed {
                groups.insert(group.trim().to_string(), true);
            } else {
                groups.remove(group.trim());
            }
        })?;
        Ok(())
    }

    pub fn add_note(&self, desc: &str, data: &str) -> Result<Note> {
        let time = self.clock.now_millis();
        let (_, note) = self.store.try_transform(|state| {
            let note = Note {
                id: next_note_id(state),
                desc: desc.to_string(),
                data: data.to_string(),
                time,
            };
            state.notes.push(note.clone());
            Ok(note)
        })?;
        Ok(note)
    }

    pub fn remove_note(&self, id: i64) -> Result<()> {
        self.store.try_transform(|state| {
            let before = state.notes.len();
            state.notes.retain(|note| note.id != id);
            found(state.notes.len() < before, "note", &id.to_string())
        })?;
        Ok(())
    }

    /// Totals for `month`; zeroes when the month does not exist.
    pub fn month_totals(&self, month: &str) -> MonthTotals {
        self.store
            .current_snapshot()
            .month(month)
            .map(MonthTotals::of)
            .unwrap_or_default()
    }

    fn edit_month<F>(&self, month: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut BudgetMonth) -> Result<()>,
    {
        self.store.try_transform(|state| {
            let entry = state
                .month_mut(month)
                .ok_or_else(|| LedgerError::InvalidInput(format!("unknown month `{month}`")))?;
            edit(entry)
        })?;
        Ok(())
    }
}

fn validate_month(key: &str) -> Result<()> {
    parse_month_key(key)
        .map(|_| ())
        .ok_or_else(|| LedgerError::InvalidInput(format!("invalid month `{key}`, expected YYYY-MM")))
}

fn found(removed: bool, what: &str, id: &str) -> Result<()> {
    if removed {
        Ok(())
    } else {
        Err(LedgerError::InvalidInput(format!("{what} `{id}` not found")))
    }
}

fn next_note_id(state: &BudgetState) -> i64 {
    state.notes.iter().map(|note| note.id).max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::FixedClock, storage::MemoryStorage};
    use chrono::NaiveDate;

    fn service() -> (MonthService, Arc<StateStore>) {
        let store = Arc::new(StateStore::new(Arc::new(MemoryStorage::new())));
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 7, 10).unwrap());
        (MonthService::new(store.clone(), Arc::new(clock)), store)
    }

    #[test]
    fn adding_a_transaction_books_and_learns() {
        let (service, store) = service();
        service.set_category("2024-07", "Food", "Living", 300.0).unwrap();
        let txn = Transaction {
            date: "2024-07-03".into(),
            desc: " Tesco ".into(),
            amount: 42.5,
            category: "Food".into(),
            ..Transaction::default()
        };
        let booked = service.add_transaction(txn).unwrap();
        assert!(!booked.id.is_empty());

        let snapshot = store.current_snapshot();
        let july = &snapshot.months["2024-07"];
        assert_eq!(july.transactions[0].desc, "Tesco");
        assert_eq!(snapshot.mapping.exact["tesco|42.50"], "Food");
        assert_eq!(snapshot.desc_list, vec!["Tesco".to_string()]);
        assert_eq!(
            service.month_totals("2024-07"),
            MonthTotals {
                budgeted: 300.0,
                spent: 42.5,
                income: 0.0,
                leftover: -42.5,
            }
        );
    }

    #[test]
    fn invalid_dates_and_months_are_rejected() {
        let (service, store) = service();
        let txn = Transaction {
            date: "03/07/2024".into(),
            ..Transaction::default()
        };
        assert!(matches!(
            service.add_transaction(txn),
            Err(LedgerError::InvalidInput(_))
        ));
        assert!(service.add_income("July", "Salary", 1.0).is_err());
        assert!(service.remove_income("2024-01", "missing").is_err());
        assert!(store.current_snapshot().months.is_empty());
    }

    #[test]
    fn duplicate_transaction_ids_are_refused() {
        let (service, _) = service();
        let txn = Transaction {
            id: "fixed".into(),
            date: "2024-07-01".into(),
            amount: 1.0,
            ..Transaction::default()
        };
        service.add_transaction(txn.clone()).unwrap();
        assert!(service.add_transaction(txn).is_err());
        service.remove_transaction("2024-07", "fixed").unwrap();
        assert!(service.remove_transaction("2024-07", "fixed").is_err());
    }

    #[test]
    fn new_months_carry_categories_forward() {
        let (service, _) = service();
        service.set_category("2024-06", "Rent", "Bills", 900.0).unwrap();
        service.add_income("2024-06", "Salary", 2000.0).unwrap();
        let july = service.ensure_month("2024-07").unwrap();
        assert_eq!(july.categories["Rent"], Category::new("Bills", 900.0));
        assert!(july.incomes.is_empty());
    }

    #[test]
    fn incomes_and_categories_can_be_removed() {
        let (service, store) = service();
        let income = service.add_income("2024-07", "Salary", 2000.0).unwrap();
        service.set_category("2024-07", "Gym", "", 30.0).unwrap();
        assert_eq!(
            store.current_snapshot().months["2024-07"].categories["Gym"].group,
            "Other"
        );
        service.remove_income("2024-07", &income.id).unwrap();
        service.remove_category("2024-07", "Gym").unwrap();
        assert!(store.current_snapshot().months["2024-07"].is_empty());
    }

    #[test]
    fn collapse_flags_only_store_true() {
        let (service, store) = service();
        service.set_collapsed("2024-07", "Bills", true).unwrap();
        assert!(store.current_snapshot().ui.is_collapsed("2024-07", "Bills"));
        service.set_collapsed("2024-07", "Bills", false).unwrap();
        assert!(store.current_snapshot().ui.collapsed.is_empty());
    }

    #[test]
    fn notes_get_sequential_ids_and_clock_time() {
        let (service, store) = service();
        let first = service.add_note("Car", "MOT due").unwrap();
        let second = service.add_note("Boiler", "").unwrap();
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(first.time, service.clock.now_millis());

        service.remove_note(1).unwrap();
        assert!(service.remove_note(1).is_err());
        let snapshot = store.current_snapshot();
        assert_eq!(snapshot.notes.len(), 1);
        assert!(snapshot.note(2).is_some());
    }
}
