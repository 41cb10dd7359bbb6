//! Import and export of ledger data.
//!
//! Exports are pretty JSON projections of a snapshot. Imports are detected
//! from the shape of the JSON document and applied through the store, so a
//! payload that is not recognised never touches the ledger.

mod csv_import;

pub use csv_import::{
    import_csv, parse_csv_transactions, parse_csv_amount, parse_csv_date, write_csv_transactions,
    CsvImportReport, ParsedCsv, SkippedRow,
};

use std::{collections::BTreeMap, fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    core::StateStore,
    errors::{LedgerError, Result},
    ledger::{
        parse_month_key, BudgetState, Category, DescriptionMap, PredictionMapping, Transaction,
    },
};

/// What an export contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Transactions of one month, as a bare array.
    Transactions,
    /// Categories of one month, wrapped as `{"categories": {...}}`.
    Categories,
    /// Learned prediction data.
    Prediction,
    /// The whole ledger.
    All,
}

impl TransferKind {
    pub fn needs_month(self) -> bool {
        matches!(self, TransferKind::Transactions | TransferKind::Categories)
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransferKind::Transactions => "transactions",
            TransferKind::Categories => "categories",
            TransferKind::Prediction => "prediction",
            TransferKind::All => "all",
        };
        f.write_str(label)
    }
}

impl FromStr for TransferKind {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "transactions" | "tx" => Ok(TransferKind::Transactions),
            "categories" => Ok(TransferKind::Categories),
            "prediction" | "predictions" => Ok(TransferKind::Prediction),
            "all" | "full" => Ok(TransferKind::All),
            other => Err(LedgerError::InvalidInput(format!(
                "unknown export kind `{other}`"
            ))),
        }
    }
}

/// Learned data shared between installations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PredictionBundle {
    pub mapping: PredictionMapping,
    pub desc_map: DescriptionMap,
    pub desc_list: Vec<String>,
}

#[derive(Serialize)]
struct CategoriesExport<'a> {
    categories: &'a BTreeMap<String, Category>,
}

#[derive(Deserialize)]
struct CategoriesImport {
    categories: BTreeMap<String, Category>,
}

#[derive(Deserialize)]
struct TransactionsImport {
    transactions: Vec<Transaction>,
}

/// Serializes the `kind` projection of `state`. Month-scoped kinds need
/// `month`; an unknown month exports as empty.
pub fn export(state: &BudgetState, kind: TransferKind, month: Option<&str>) -> Result<String> {
    let json = match kind {
        TransferKind::All => serde_json::to_string_pretty(state)?,
        TransferKind::Prediction => serde_json::to_string_pretty(&PredictionBundle {
            mapping: state.mapping.clone(),
            desc_map: state.desc_map.clone(),
            desc_list: state.desc_list.clone(),
        })?,
        TransferKind::Transactions => {
            let month = state.month(required_month(kind, month)?);
            let transactions: &[Transaction] =
                month.map(|m| m.transactions.as_slice()).unwrap_or_default();
            serde_json::to_string_pretty(transactions)?
        }
        TransferKind::Categories => {
            let empty = BTreeMap::new();
            let categories = state
                .month(required_month(kind, month)?)
                .map_or(&empty, |m| &m.categories);
            serde_json::to_string_pretty(&CategoriesExport { categories })?
        }
    };
    Ok(json)
}

/// Parsed import document.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    All(Box<BudgetState>),
    Transactions(Vec<Transaction>),
    Categories(BTreeMap<String, Category>),
    Prediction(PredictionBundle),
}

impl ImportPayload {
    pub fn kind(&self) -> TransferKind {
        match self {
            ImportPayload::All(_) => TransferKind::All,
            ImportPayload::Transactions(_) => TransferKind::Transactions,
            ImportPayload::Categories(_) => TransferKind::Categories,
            ImportPayload::Prediction(_) => TransferKind::Prediction,
        }
    }

    /// Recognises a document by its containers.
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|err| LedgerError::InvalidImport(format!("not JSON: {err}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let kind = detect(&value).ok_or_else(|| {
            LedgerError::InvalidImport(
                "expected a ledger, transactions, categories or prediction document".into(),
            )
        })?;
        let payload = match kind {
            TransferKind::All => ImportPayload::All(Box::new(decode(value)?)),
            TransferKind::Transactions if value.is_array() => {
                ImportPayload::Transactions(decode(value)?)
            }
            TransferKind::Transactions => {
                ImportPayload::Transactions(decode::<TransactionsImport>(value)?.transactions)
            }
            TransferKind::Categories => {
                ImportPayload::Categories(decode::<CategoriesImport>(value)?.categories)
            }
            TransferKind::Prediction => ImportPayload::Prediction(decode(value)?),
        };
        Ok(payload)
    }

    /// Applies the payload through `store`. Month-scoped payloads go into
    /// `month`; transactions without a target month are filed by their date.
    pub fn apply(self, store: &StateStore, month: Option<&str>) -> Result<Arc<BudgetState>> {
        let kind = self.kind();
        let snapshot = match self {
            ImportPayload::All(state) => store.import_snapshot(*state)?,
            ImportPayload::Prediction(bundle) => store.import_snapshot(BudgetState {
                mapping: bundle.mapping,
                desc_map: bundle.desc_map,
                desc_list: bundle.desc_list,
                ..BudgetState::default()
            })?,
            ImportPayload::Transactions(transactions) => {
                let month = month.map(|_| required_month(kind, month)).transpose()?;
                store
                    .try_transform(|state| merge_transactions(state, transactions, month))?
                    .0
            }
            ImportPayload::Categories(categories) => {
                let month = required_month(kind, month)?;
                store.transform(|state| {
                    state.ensure_month(month).categories.extend(categories);
                })?
            }
        };
        info!(kind = %kind, "import applied");
        Ok(snapshot)
    }
}

/// Parses and applies `json` in one go.
pub fn import_json(store: &StateStore, json: &str, month: Option<&str>) -> Result<Arc<BudgetState>> {
    ImportPayload::parse(json)?.apply(store, month)
}

fn merge_transactions(
    state: &mut BudgetState,
    transactions: Vec<Transaction>,
    month: Option<&str>,
) -> Result<()> {
    let mut added = 0usize;
    let mut skipped = 0usize;
    for mut txn in transactions {
        let key = match month {
            Some(month) => month.to_string(),
            None => match txn.month_key() {
                Some(key) => key,
                None => {
                    skipped += 1;
                    continue;
                }
            },
        };
        let entry = state.ensure_month(&key);
        if !txn.id.trim().is_empty() && entry.transaction(&txn.id).is_some() {
            skipped += 1;
            continue;
        }
        txn.ensure_id();
        entry.transactions.push(txn);
        added += 1;
    }
    debug!(added, skipped, "merged imported transactions");
    Ok(())
}

fn detect(value: &Value) -> Option<TransferKind> {
    let fields = match value {
        Value::Array(_) => return Some(TransferKind::Transactions),
        Value::Object(fields) => fields,
        _ => return None,
    };
    if fields.contains_key("months") || fields.contains_key("version") {
        Some(TransferKind::All)
    } else if fields.get("transactions").is_some_and(Value::is_array) {
        Some(TransferKind::Transactions)
    } else if fields.get("categories").is_some_and(Value::is_object) {
        Some(TransferKind::Categories)
    } else if ["mapping", "descMap", "descList"]
        .iter()
        .any(|key| fields.contains_key(*key))
    {
        Some(TransferKind::Prediction)
    } else {
        None
    }
}

fn required_month(kind: TransferKind, month: Option<&str>) -> Result<&str> {
    let month = month
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LedgerError::InvalidInput(format!("{kind} transfer needs a month")))?;
    match parse_month_key(month) {
        Some(_) => Ok(month),
        None => Err(LedgerError::InvalidInput(format!(
            "invalid month `{month}`, expected YYYY-MM"
        ))),
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|err| LedgerError::InvalidImport(err.to_string()))
}
