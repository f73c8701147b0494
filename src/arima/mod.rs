//! ARIMA modeling: differencing, stationarity testing, order estimation
//! and conditional-least-squares fitting with AICc-based grid search.

mod diff;
mod model;
mod order;
mod stationarity;

pub use diff::{difference, integrate};
pub use model::{Arima, ArimaOrder};
pub use order::{estimate_orders, max_ar_order, max_ma_order, search_best_model, select_d};
pub use stationarity::{adf_test, is_stationary, AdfResult};
