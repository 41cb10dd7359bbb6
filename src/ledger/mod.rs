//! Ledger data model: the root [`BudgetState`] aggregate and everything it owns.

pub mod category;
pub mod lenient;
pub mod month;
pub mod month_key;
pub mod prediction;
pub mod state;
pub mod transaction;

pub use category::{Category, DEFAULT_GROUP};
pub use month::BudgetMonth;
pub use month_key::{days_in_month, month_key, month_length, parse_date, parse_month_key};
pub use prediction::{Bag, DescriptionMap, PredictionMapping};
pub use state::{BudgetState, Note, UiPreferences, STATE_VERSION};
pub use transaction::{Income, Transaction};
