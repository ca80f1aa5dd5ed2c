//! End-to-end HST pipeline
//!
//! Runs the stages strictly in sequence, each one fully materialised before the
//! next starts:
//!
//! ```text
//! DataLoader -> HstFeatureBuilder -> OlsRegression -> Predictor -> ResultWriter
//! ```
//!
//! Stage outputs are plain values threaded through function arguments; nothing is
//! shared between runs.

mod config;

pub use config::{PipelineConfig, DEFAULT_OUTPUT};

use crate::data::ObservationSeries;
use crate::error::Result;
use crate::inference::{Predictor, ResultRecord};
use crate::timeseries::{FeatureSet, HstFeatureBuilder, CONST_COLUMN};
use crate::training::{FittedModel, OlsRegression};
use crate::utils::{DataLoader, ResultWriter};
use std::path::Path;
use std::time::Instant;
use tracing::{info, info_span};

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub series: ObservationSeries,
    pub features: FeatureSet,
    pub model: FittedModel,
    pub results: Vec<ResultRecord>,
}

/// HST regression pipeline
#[derive(Debug, Clone, Default)]
pub struct HstPipeline {
    config: PipelineConfig,
}

impl HstPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load, build features, fit and predict. Writes nothing.
    pub fn run<P: AsRef<Path>>(&self, input: P) -> Result<PipelineOutput> {
        let series = {
            let _span = info_span!("loading").entered();
            DataLoader::with_config(self.config.loader.clone()).load(input)?
        };
        self.run_series(series)
    }

    /// Run the stages after loading on an already cleaned series
    pub fn run_series(&self, series: ObservationSeries) -> Result<PipelineOutput> {
        let features = {
            let _span = info_span!("features").entered();
            HstFeatureBuilder::new().build(&series)?
        };

        let model = {
            let _span = info_span!("fitting").entered();
            let start = Instant::now();
            let x = features.design_matrix()?;
            let y = series.targets();
            let names = FeatureSet::column_names();
            let constant_index = names.iter().position(|n| n == CONST_COLUMN);
            let model = OlsRegression::with_config(self.config.fit.clone()).fit(&x, &y, &names, constant_index)?;
            info!(
                rows = model.summary.n_obs,
                r_squared = model.summary.r_squared,
                elapsed = ?start.elapsed(),
                "fitted OLS model"
            );
            model
        };

        let results = {
            let _span = info_span!("prediction").entered();
            Predictor::new().records(&series, &features, &model)?
        };

        Ok(PipelineOutput {
            series,
            features,
            model,
            results,
        })
    }

    /// Run the pipeline and write the configured outputs.
    ///
    /// Every output is rendered and staged next to its target before any of
    /// them is moved into place, so a failing run leaves no file behind.
    pub fn run_and_save<P: AsRef<Path>>(&self, input: P) -> Result<PipelineOutput> {
        let output = self.run(input)?;

        let _span = info_span!("output").entered();
        let csv = ResultWriter::csv_bytes(&output.results)?;
        let json = match &self.config.model_json_path {
            Some(_) => Some(ResultWriter::model_json(&output.model)?),
            None => None,
        };

        let mut staged = vec![ResultWriter::stage(&self.config.output_path, &csv)?];
        if let (Some(path), Some(json)) = (&self.config.model_json_path, &json) {
            staged.push(ResultWriter::stage(path, json.as_bytes())?);
        }
        for file in staged {
            let path = file.target().display().to_string();
            file.commit()?;
            info!(path = %path, "wrote output");
        }

        Ok(output)
    }
}
