#![doc(test(attr(deny(warnings))))]

//! Budget Ledger keeps a personal monthly budget as one snapshot, merges
//! snapshots from other installations, and predicts month-end balances and
//! transaction categories from the history it has seen.

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod transfer;
pub mod utils;

pub use crate::core::ledger_manager::LedgerManager;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log. `directive`
/// is used when `RUST_LOG` is unset.
pub fn init(directive: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(directive);
        tracing::info!("Budget Ledger tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init(None);
        super::init(Some("budget_ledger=debug"));
    }
}
