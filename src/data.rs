//! Observation schema
//!
//! Typed records for the measurement series. Column lookup by name happens only
//! once, at the file boundary in [`crate::utils::data_loader`]; everything
//! downstream works on these structs.

use chrono::NaiveDateTime;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A single row as read from the input file, before cleaning.
///
/// Measurements are `None` when the cell held a missing-value marker or could not
/// be parsed as a finite number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub ts: NaiveDateTime,
    pub temperature: Option<f64>,
    pub ensoleillement: Option<f64>,
    pub deplacement: Option<f64>,
}

impl RawObservation {
    pub fn new(
        ts: NaiveDateTime,
        temperature: Option<f64>,
        ensoleillement: Option<f64>,
        deplacement: Option<f64>,
    ) -> Self {
        Self {
            ts,
            temperature,
            ensoleillement,
            deplacement,
        }
    }
}

/// A cleaned observation: every field is present and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Measurement time, the sole ordering key
    pub ts: NaiveDateTime,
    pub temperature: f64,
    /// Solar exposure
    pub ensoleillement: f64,
    /// Displacement, the regression target
    pub deplacement: f64,
}

/// Cleaned, time-sorted series of observations.
///
/// Invariants (established by [`crate::utils::DataLoader::clean`]):
/// - `ts` is non-decreasing, ties keep their input order;
/// - all measurements are finite;
/// - at least two observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
}

impl ObservationSeries {
    pub(crate) fn from_sorted(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Timestamps in series order
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.observations.iter().map(|o| o.ts).collect()
    }

    /// Target vector `y` (the `deplacement` column)
    pub fn targets(&self) -> Array1<f64> {
        self.observations.iter().map(|o| o.deplacement).collect()
    }
}

impl<'a> IntoIterator for &'a ObservationSeries {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}
