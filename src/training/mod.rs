//! Model fitting
//!
//! Provides ordinary least squares on a dense design matrix:
//! - pivoted Householder QR solver with rank detection
//! - statsmodels-style fit summary (standard errors, t tests, R², F test)

pub mod linear_models;
pub mod summary;

pub use linear_models::{FitConfig, FittedModel, OlsRegression, PivotedQr};
pub use summary::FitSummary;
