//! Transactions as CSV: `Date,Description,Category,Amount`, with
//! `dd/mm/yyyy` dates and `£`-prefixed amounts.

use std::{
    collections::BTreeSet,
    io::{Read, Write},
};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    core::{services::category_predictor, StateStore},
    errors::{LedgerError, Result},
    ledger::{parse_date, Transaction},
};

const HEADERS: [&str; 4] = ["Date", "Description", "Category", "Amount"];
const CURRENCY_SYMBOL: char = '£';

/// A data row that could not be turned into a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based line in the input, header included.
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCsv {
    pub transactions: Vec<Transaction>,
    pub skipped: Vec<SkippedRow>,
}

/// Outcome of [`import_csv`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CsvImportReport {
    pub imported: usize,
    /// Rows identical to a transaction already in the month.
    pub duplicates: usize,
    pub skipped: Vec<SkippedRow>,
    pub months: BTreeSet<String>,
}

struct Columns {
    date: usize,
    desc: usize,
    category: Option<usize>,
    amount: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| {
                LedgerError::InvalidImport(format!("CSV header is missing the `{name}` column"))
            })
        };
        Ok(Self {
            date: required("Date")?,
            desc: required("Description")?,
            category: find("Category"),
            amount: required("Amount")?,
        })
    }
}

/// Reads transactions from CSV. Rows that fail to parse are reported, not
/// fatal; a missing header is.
pub fn parse_csv_transactions<R: Read>(reader: R) -> Result<ParsedCsv> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let columns = Columns::locate(rdr.headers()?)?;

    let mut parsed = ParsedCsv::default();
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map_or(0, |pos| pos.line());
                warn!(line, error = %err, "skipping unreadable CSV row");
                parsed.skipped.push(SkippedRow {
                    line,
                    reason: err.to_string(),
                });
                continue;
            }
        };
        let line = record.position().map_or(0, |pos| pos.line());
        match parse_row(&record, &columns) {
            Ok(txn) => parsed.transactions.push(txn),
            Err(reason) => {
                warn!(line, %reason, "skipping CSV row");
                parsed.skipped.push(SkippedRow { line, reason });
            }
        }
    }
    debug!(
        rows = parsed.transactions.len(),
        skipped = parsed.skipped.len(),
        "parsed CSV transactions"
    );
    Ok(parsed)
}

fn parse_row(record: &StringRecord, columns: &Columns) -> std::result::Result<Transaction, String> {
    let field = |idx: usize| record.get(idx).map(str::trim).unwrap_or_default();

    let raw_date = field(columns.date);
    let date = parse_csv_date(raw_date).ok_or_else(|| format!("invalid date `{raw_date}`"))?;
    let raw_amount = field(columns.amount);
    let amount =
        parse_csv_amount(raw_amount).ok_or_else(|| format!("invalid amount `{raw_amount}`"))?;
    let category = columns.category.map(field).unwrap_or_default();
    Ok(Transaction::new(date, field(columns.desc), amount, category))
}

/// `dd/mm/yyyy`; ISO dates are accepted as well.
pub fn parse_csv_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%d/%m/%Y")
        .ok()
        .or_else(|| parse_date(value))
}

/// Parses `£1,234.50`, `-£3.20`, `£-3.20`, `3.20-`, `(3.20)` and plain
/// numbers. Non-finite results are rejected.
pub fn parse_csv_amount(value: &str) -> Option<f64> {
    let mut cleaned: String = value
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != ',' && *ch != CURRENCY_SYMBOL)
        .collect();
    let mut negative = false;
    if cleaned.starts_with('(') && cleaned.ends_with(')') && cleaned.len() > 2 {
        cleaned = cleaned[1..cleaned.len() - 1].to_string();
        negative = true;
    }
    if let Some(rest) = cleaned.strip_suffix('-') {
        cleaned = rest.to_string();
        negative = !negative;
    }
    if !cleaned
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+'))
    {
        return None;
    }
    let amount: f64 = cleaned.parse().ok()?;
    if !amount.is_finite() {
        return None;
    }
    Some(if negative { -amount } else { amount })
}

/// Writes `transactions` in the import format.
pub fn write_csv_transactions<W: Write>(writer: W, transactions: &[Transaction]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADERS)?;
    for txn in transactions {
        let date = txn
            .parsed_date()
            .map(|date| date.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| txn.date.clone());
        let sign = if txn.amount < 0.0 { "-" } else { "" };
        let amount = format!("{sign}{CURRENCY_SYMBOL}{:.2}", txn.amount.abs());
        wtr.write_record([
            date.as_str(),
            txn.desc.as_str(),
            txn.category.as_str(),
            amount.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Parses `reader` and books every row into the month of its date in one
/// transform. Categorised rows also train the category predictor.
pub fn import_csv<R: Read>(store: &StateStore, reader: R) -> Result<CsvImportReport> {
    let parsed = parse_csv_transactions(reader)?;
    let mut report = CsvImportReport {
        skipped: parsed.skipped,
        ..CsvImportReport::default()
    };
    if parsed.transactions.is_empty() {
        return Ok(report);
    }

    let (_, report) = store.try_transform(move |state| {
        for txn in parsed.transactions {
            let Some(key) = txn.month_key() else {
                continue;
            };
            let month = state.ensure_month(&key);
            let duplicate = month.transactions.iter().any(|existing| {
                existing.date == txn.date
                    && existing.desc.trim() == txn.desc.trim()
                    && existing.amount == txn.amount
                    && existing.category.trim() == txn.category.trim()
            });
            if duplicate {
                report.duplicates += 1;
                continue;
            }
            month.transactions.push(txn.clone());
            category_predictor::record_into(state, &txn);
            report.imported += 1;
            report.months.insert(key);
        }
        Ok(report)
    })?;
    debug!(
        imported = report.imported,
        duplicates = report.duplicates,
        skipped = report.skipped.len(),
        "CSV import applied"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    const SAMPLE: &str = "\
Date,Description,Category,Amount
03/07/2024,Tesco,Food,£12.50
04/07/2024,Refund,Food,-£2.00
31/02/2024,Ghost,Food,£1.00
05/07/2024,Rent,Bills,\"£1,250.00\"
06/07/2024,Mystery,,abc
01/08/2024,Cinema,,£9.99
";

    #[test]
    fn amounts_accept_currency_signs_and_separators() {
        assert_eq!(parse_csv_amount("£12.50"), Some(12.5));
        assert_eq!(parse_csv_amount("-£3.20"), Some(-3.2));
        assert_eq!(parse_csv_amount("£-3.20"), Some(-3.2));
        assert_eq!(parse_csv_amount("3.20-"), Some(-3.2));
        assert_eq!(parse_csv_amount("(£3.20)"), Some(-3.2));
        assert_eq!(parse_csv_amount("£1,234.56"), Some(1234.56));
        assert_eq!(parse_csv_amount(" 7 "), Some(7.0));
        assert_eq!(parse_csv_amount("NaN"), None);
        assert_eq!(parse_csv_amount("inf"), None);
        assert_eq!(parse_csv_amount(""), None);
        assert_eq!(parse_csv_amount("£"), None);
    }

    #[test]
    fn dates_are_day_first() {
        assert_eq!(
            parse_csv_date("03/07/2024"),
            NaiveDate::from_ymd_opt(2024, 7, 3)
        );
        assert_eq!(
            parse_csv_date("2024-07-03"),
            NaiveDate::from_ymd_opt(2024, 7, 3)
        );
        assert_eq!(parse_csv_date("31/02/2024"), None);
    }

    #[test]
    fn malformed_rows_are_skipped_and_reported() {
        let parsed = parse_csv_transactions(SAMPLE.as_bytes()).unwrap();
        assert_eq!(parsed.transactions.len(), 4);
        assert_eq!(parsed.skipped.len(), 2);
        assert_eq!(parsed.skipped[0].line, 4);
        assert!(parsed.skipped[1].reason.contains("abc"));
        assert_eq!(parsed.transactions[2].amount, 1250.0);
        assert_eq!(parsed.transactions[2].date, "2024-07-05");
    }

    #[test]
    fn missing_header_is_fatal() {
        let err = parse_csv_transactions("When,What\n01/01/2024,x\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidImport(_)));
    }

    #[test]
    fn import_books_rows_learns_and_skips_duplicates() {
        let store = StateStore::new(Arc::new(MemoryStorage::new()));
        let report = import_csv(&store, SAMPLE.as_bytes()).unwrap();
        assert_eq!(report.imported, 4);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(
            report.months.iter().cloned().collect::<Vec<_>>(),
            vec!["2024-07".to_string(), "2024-08".to_string()]
        );

        let snapshot = store.current_snapshot();
        assert_eq!(snapshot.months["2024-07"].transactions.len(), 3);
        assert_eq!(snapshot.mapping.exact["tesco|12.50"], "Food");
        assert!(snapshot.desc_list.contains(&"Cinema".to_string()));
        assert!(!snapshot.mapping.exact.keys().any(|key| key.starts_with("cinema")));

        let again = import_csv(&store, SAMPLE.as_bytes()).unwrap();
        assert_eq!(again.imported, 0);
        assert_eq!(again.duplicates, 4);
    }

    #[test]
    fn written_csv_reads_back() {
        let txns = vec![
            Transaction {
                date: "2024-07-03".into(),
                desc: "Tesco, Metro".into(),
                amount: 12.5,
                category: "Food".into(),
                ..Transaction::default()
            },
            Transaction {
                date: "2024-07-04".into(),
                desc: "Refund".into(),
                amount: -2.0,
                ..Transaction::default()
            },
        ];
        let mut out = Vec::new();
        write_csv_transactions(&mut out, &txns).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Date,Description,Category,Amount\n03/07/2024,\"Tesco, Metro\",Food,£12.50"));

        let parsed = parse_csv_transactions(text.as_bytes()).unwrap();
        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.transactions[1].amount, -2.0);
        assert_eq!(parsed.transactions[0].desc, "Tesco, Metro");
    }
}
