//! Ledger engine: the state store, its normalizer, and the prediction
//! services evaluated against store snapshots.

pub mod ledger_manager;
pub mod merge;
pub mod normalizer;
pub mod services;
pub mod store;
pub mod time;

pub use ledger_manager::LedgerManager;
pub use normalizer::normalize;
pub use store::StateStore;
pub use time::{Clock, FixedClock, SystemClock};
