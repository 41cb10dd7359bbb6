use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Category, Income, Transaction};

/// One budgeting period (`"YYYY-MM"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BudgetMonth {
    pub incomes: Vec<Income>,
    pub transactions: Vec<Transaction>,
    pub categories: BTreeMap<String, Category>,
}

impl BudgetMonth {
    /// Starts a month that carries the category set (and budgets) of
    /// `previous` forward with no incomes or transactions.
    pub fn seeded_from(previous: &BudgetMonth) -> Self {
        Self {
            incomes: Vec::new(),
            transactions: Vec::new(),
            categories: previous.categories.clone(),
        }
    }

    pub fn income_total(&self) -> f64 {
        self.incomes.iter().map(|income| income.amount).sum()
    }

    pub fn spent_total(&self) -> f64 {
        self.transactions.iter().map(|txn| txn.amount).sum()
    }

    pub fn budget_total(&self) -> f64 {
        self.categories.values().map(|category| category.budget).sum()
    }

    /// Sum of transaction amounts booked against `category`.
    pub fn spent_in(&self, category: &str) -> f64 {
        self.transactions
            .iter()
            .filter(|txn| txn.category == category)
            .map(|txn| txn.amount)
            .sum()
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.incomes.is_empty() && self.transactions.is_empty() && self.categories.is_empty()
    }
}
