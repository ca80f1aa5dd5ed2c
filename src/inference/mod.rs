//! Prediction module
//!
//! Applies a fitted model back onto the design matrix it was fitted on and
//! computes residuals for inspection.

mod engine;

pub use engine::{Prediction, Predictor, ResultRecord};
