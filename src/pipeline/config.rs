//! Pipeline configuration

use crate::training::FitConfig;
use crate::utils::LoaderConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default output file
pub const DEFAULT_OUTPUT: &str = "hst_results.csv";

/// Configuration for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input parsing options
    pub loader: LoaderConfig,
    /// Least squares options
    pub fit: FitConfig,
    /// Result CSV destination
    pub output_path: PathBuf,
    /// Optional JSON export of the fitted model
    pub model_json_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            fit: FitConfig::default(),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            model_json_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loader(mut self, loader: LoaderConfig) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_fit(mut self, fit: FitConfig) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_model_json<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.model_json_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.output_path, PathBuf::from("hst_results.csv"));
        assert_eq!(config.loader.separator, b',');
        assert!(config.loader.null_values.iter().any(|v| v == "NAN"));
        assert!(config.model_json_path.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = PipelineConfig::new()
            .with_loader(LoaderConfig::new().with_separator(b';'))
            .with_fit(FitConfig::new().with_rank_tolerance(1e-8))
            .with_output("out.csv")
            .with_model_json("model.json");

        assert_eq!(config.loader.separator, b';');
        assert_eq!(config.fit.rank_tolerance, 1e-8);
        assert_eq!(config.output_path, PathBuf::from("out.csv"));
        assert_eq!(config.model_json_path, Some(PathBuf::from("model.json")));
    }

    #[test]
    fn test_null_values_always_keep_nan_marker() {
        let loader = LoaderConfig::new().with_null_values(vec!["-9999".to_string()]);
        assert!(loader.null_values.iter().any(|v| v == "NAN"));
        assert!(loader.null_values.iter().any(|v| v == "-9999"));
    }
}
