//! HST feature engineering
//!
//! Derives the thermal, seasonal and trend regressors from a cleaned series. The
//! column order of the design matrix is fixed by [`FEATURE_COLUMNS`], with the
//! constant column prepended, and is shared by fitting and prediction.

use crate::data::ObservationSeries;
use crate::error::{HstError, Result};
use chrono::{NaiveDateTime, Timelike};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Name of the intercept column, always column 0 of the design matrix
pub const CONST_COLUMN: &str = "const";

/// Regressors in design-matrix order (after the constant)
pub const FEATURE_COLUMNS: [&str; 8] = [
    "temperature",
    "temp2",
    "ensoleillement",
    "ens2",
    "sin_hour",
    "cos_hour",
    "t",
    "t2",
];

/// Number of design-matrix columns, constant included
pub const N_DESIGN_COLUMNS: usize = FEATURE_COLUMNS.len() + 1;

const SECONDS_PER_DAY: f64 = 86_400.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Derived features for one observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Elapsed days since the series origin
    pub t: f64,
    /// Fractional hour of day in `[0, 24)`
    pub hour: f64,
    pub sin_hour: f64,
    pub cos_hour: f64,
    pub temperature: f64,
    pub temp2: f64,
    pub ensoleillement: f64,
    pub ens2: f64,
    pub t2: f64,
}

impl FeatureRecord {
    /// Regressor values in [`FEATURE_COLUMNS`] order
    pub fn values(&self) -> [f64; 8] {
        [
            self.temperature,
            self.temp2,
            self.ensoleillement,
            self.ens2,
            self.sin_hour,
            self.cos_hour,
            self.t,
            self.t2,
        ]
    }
}

/// Feature records for a whole series, with the time origin they were computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    origin: NaiveDateTime,
    records: Vec<FeatureRecord>,
}

impl FeatureSet {
    /// Earliest timestamp of the series; `t` is measured from here
    pub fn origin(&self) -> NaiveDateTime {
        self.origin
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Design-matrix column names: `const` followed by [`FEATURE_COLUMNS`]
    pub fn column_names() -> Vec<String> {
        std::iter::once(CONST_COLUMN)
            .chain(FEATURE_COLUMNS)
            .map(|s| s.to_string())
            .collect()
    }

    /// The `n × 9` design matrix, constant column first
    pub fn design_matrix(&self) -> Result<Array2<f64>> {
        let mut data = Vec::with_capacity(self.records.len() * N_DESIGN_COLUMNS);
        for record in &self.records {
            data.push(1.0);
            data.extend_from_slice(&record.values());
        }
        Ok(Array2::from_shape_vec((self.records.len(), N_DESIGN_COLUMNS), data)?)
    }
}

/// Fractional hour of day: hour + minute / 60, seconds ignored
pub fn hour_of_day(ts: &NaiveDateTime) -> f64 {
    ts.hour() as f64 + ts.minute() as f64 / 60.0
}

/// Encode an hour on the 24h circle as `(sin, cos)`.
///
/// The hour is reduced modulo 24 first, so 24.0 encodes exactly like 0.0.
pub fn cyclic_hour(hour: f64) -> (f64, f64) {
    let angle = 2.0 * PI * hour.rem_euclid(HOURS_PER_DAY) / HOURS_PER_DAY;
    (angle.sin(), angle.cos())
}

/// Elapsed time from `origin` to `ts` in fractional days
pub fn elapsed_days(origin: &NaiveDateTime, ts: &NaiveDateTime) -> f64 {
    let delta = *ts - *origin;
    let seconds = delta.num_seconds() as f64;
    let subsec = delta.subsec_nanos() as f64 * 1e-9;
    (seconds + subsec) / SECONDS_PER_DAY
}

/// Builds HST features from an [`ObservationSeries`].
#[derive(Debug, Clone, Default)]
pub struct HstFeatureBuilder;

impl HstFeatureBuilder {
    pub fn new() -> Self {
        Self
    }

    /// One feature record per observation, in series order.
    ///
    /// The origin is the minimum timestamp over the whole series, computed once.
    pub fn build(&self, series: &ObservationSeries) -> Result<FeatureSet> {
        let origin = series
            .iter()
            .map(|o| o.ts)
            .min()
            .ok_or_else(|| HstError::Feature("cannot build features from an empty series".to_string()))?;

        let records = series
            .iter()
            .map(|o| {
                let t = elapsed_days(&origin, &o.ts);
                let hour = hour_of_day(&o.ts);
                let (sin_hour, cos_hour) = cyclic_hour(hour);
                FeatureRecord {
                    t,
                    hour,
                    sin_hour,
                    cos_hour,
                    temperature: o.temperature,
                    temp2: o.temperature.powi(2),
                    ensoleillement: o.ensoleillement,
                    ens2: o.ensoleillement.powi(2),
                    t2: t.powi(2),
                }
            })
            .collect();

        Ok(FeatureSet { origin, records })
    }
}
