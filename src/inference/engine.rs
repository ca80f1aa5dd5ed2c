//! Prediction and residuals

use crate::data::ObservationSeries;
use crate::error::{HstError, Result};
use crate::timeseries::FeatureSet;
use crate::training::FittedModel;
use chrono::NaiveDateTime;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// One output row: observed, predicted and residual displacement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub ts: NaiveDateTime,
    pub deplacement: f64,
    pub pred_deplacement: f64,
    /// `deplacement - pred_deplacement`
    pub residu: f64,
}

/// Predicted values and residuals, in input row order
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub predicted: Array1<f64>,
    pub residuals: Array1<f64>,
}

/// Applies fitted coefficients to a design matrix.
///
/// Pure: inputs are never modified.
#[derive(Debug, Clone, Copy, Default)]
pub struct Predictor;

impl Predictor {
    pub fn new() -> Self {
        Self
    }

    /// `predicted[i] = constant + Σ_j coef[j] · x[i, j]` over the non-constant
    /// columns, and `residual[i] = y[i] − predicted[i]`.
    pub fn predict(&self, model: &FittedModel, x: &Array2<f64>, y: &Array1<f64>) -> Result<Prediction> {
        let (n_rows, n_cols) = x.dim();
        if n_cols != model.n_columns() {
            return Err(HstError::Prediction(format!(
                "model has {} coefficients but design matrix has {} columns",
                model.n_columns(),
                n_cols
            )));
        }
        if n_rows != y.len() {
            return Err(HstError::Prediction(format!(
                "design matrix has {} rows but target has {}",
                n_rows,
                y.len()
            )));
        }

        let constant = model.constant();
        let predicted: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .zip(model.coefficients.iter())
                    .enumerate()
                    .filter(|(j, _)| Some(*j) != model.constant_index)
                    .fold(constant, |acc, (_, (xv, beta))| acc + beta * xv)
            })
            .collect();

        let residuals = y - &predicted;
        Ok(Prediction { predicted, residuals })
    }

    /// Predict over a whole series and pair the values with their timestamps
    pub fn records(
        &self,
        series: &ObservationSeries,
        features: &FeatureSet,
        model: &FittedModel,
    ) -> Result<Vec<ResultRecord>> {
        if series.len() != features.len() {
            return Err(HstError::Prediction(format!(
                "{} observations but {} feature rows",
                series.len(),
                features.len()
            )));
        }

        let x = features.design_matrix()?;
        let y = series.targets();
        let prediction = self.predict(model, &x, &y)?;

        Ok(series
            .iter()
            .zip(prediction.predicted.iter().zip(prediction.residuals.iter()))
            .map(|(obs, (&pred, &res))| ResultRecord {
                ts: obs.ts,
                deplacement: obs.deplacement,
                pred_deplacement: pred,
                residu: res,
            })
            .collect())
    }
}
