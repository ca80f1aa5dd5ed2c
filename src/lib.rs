//! HST pipeline - Hydrostatic-Seasonal-Time displacement regression
//!
//! Explains and predicts the displacement of a monitored structure from
//! temperature, solar exposure and time:
//! - Load and clean a time-ordered measurement series
//! - Derive thermal, 24h cyclic and time-trend features
//! - Fit ordinary least squares with rank detection
//! - Predict and compute residuals
//!
//! # Modules
//!
//! - [`utils`] - File loading, cleaning and result writing
//! - [`data`] - Typed observation records
//! - [`imputation`] - Gap filling for the displacement target
//! - [`timeseries`] - HST feature construction
//! - [`training`] - OLS fitting and fit summary
//! - [`inference`] - Predictions and residuals
//! - [`pipeline`] - End-to-end run
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Data
pub mod data;
pub mod imputation;
pub mod utils;

// Model
pub mod timeseries;
pub mod training;
pub mod inference;

// Orchestration
pub mod pipeline;
pub mod cli;

pub use error::{HstError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{HstError, Result};
    pub use crate::data::{Observation, ObservationSeries, RawObservation};
    pub use crate::utils::{DataLoader, LoaderConfig, ResultWriter};
    pub use crate::timeseries::{FeatureRecord, FeatureSet, HstFeatureBuilder, FEATURE_COLUMNS};
    pub use crate::training::{FitConfig, FitSummary, FittedModel, OlsRegression};
    pub use crate::inference::{Prediction, Predictor, ResultRecord};
    pub use crate::pipeline::{HstPipeline, PipelineConfig, PipelineOutput};
}
