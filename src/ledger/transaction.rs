//! Month entries: spending transactions and income lines.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{lenient, month_key};

/// A single spending entry. Positive amounts are spending, negative amounts
/// are refunds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Transaction {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    /// `YYYY-MM-DD`.
    #[serde(deserialize_with = "lenient::text")]
    pub date: String,
    #[serde(deserialize_with = "lenient::text")]
    pub desc: String,
    #[serde(deserialize_with = "lenient::amount")]
    pub amount: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub category: String,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        desc: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            desc: desc.into(),
            amount,
            category: category.into(),
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        month_key::parse_date(&self.date)
    }

    pub fn day_of_month(&self) -> Option<u32> {
        self.parsed_date().map(|date| date.day())
    }

    /// Month key derived from the transaction date.
    pub fn month_key(&self) -> Option<String> {
        self.parsed_date().map(month_key::month_key)
    }

    /// Assigns a fresh identifier when the entry arrived without one.
    pub fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Income {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::amount")]
    pub amount: f64,
}

impl Income {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_dates_expose_day_and_month() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 19).unwrap();
        let txn = Transaction::new(date, "Tesco", 12.5, "Food");
        assert_eq!(txn.date, "2024-07-19");
        assert_eq!(txn.day_of_month(), Some(19));
        assert_eq!(txn.month_key().as_deref(), Some("2024-07"));
        assert!(!txn.id.is_empty());
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let txn: Transaction = serde_json::from_str(r#"{"desc": "Bus", "id": 7}"#).unwrap();
        assert_eq!(txn.id, "7");
        assert_eq!(txn.amount, 0.0);
        assert!(txn.day_of_month().is_none());
    }

    #[test]
    fn ensure_id_only_fills_blank_ids() {
        let mut txn = Transaction {
            id: "  ".into(),
            ..Transaction::default()
        };
        txn.ensure_id();
        assert!(!txn.id.trim().is_empty());
        let kept = txn.id.clone();
        txn.ensure_id();
        assert_eq!(txn.id, kept);
    }
}
