//! Time series feature construction
//!
//! Provides the HST regressors: thermal terms, 24h cyclic encoding of the hour of
//! day, and a quadratic time trend.

mod features;

pub use features::{
    cyclic_hour, elapsed_days, hour_of_day, FeatureRecord, FeatureSet, HstFeatureBuilder,
    CONST_COLUMN, FEATURE_COLUMNS, N_DESIGN_COLUMNS,
};
