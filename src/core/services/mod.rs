//! Prediction and editing services evaluated against [`StateStore`]
//! snapshots.
//!
//! [`StateStore`]: crate::core::StateStore

pub mod balance_predictor;
pub mod category_predictor;
pub mod description_predictor;
pub mod month_service;

pub use balance_predictor::{BalancePrediction, BalancePredictor, RemainderPick};
pub use category_predictor::CategoryPredictor;
pub use description_predictor::{DescriptionPredictor, DEFAULT_SUGGESTION_LIMIT};
pub use month_service::{MonthService, MonthTotals};
