//! Error types for the HST pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, HstError>;

/// Main error type for the pipeline.
///
/// Every variant belongs to exactly one stage, see [`HstError::stage`].
#[derive(Error, Debug)]
pub enum HstError {
    #[error("Data format error: {0}")]
    DataFormat(String),

    #[error("Feature construction error: {0}")]
    Feature(String),

    #[error("Rank deficiency: design matrix has rank {rank} but {columns} columns")]
    RankDeficiency { rank: usize, columns: usize },

    #[error("Fitting error: {0}")]
    Fitting(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl HstError {
    /// Name of the pipeline stage the error was raised in
    pub fn stage(&self) -> &'static str {
        match self {
            HstError::DataFormat(_) => "loading",
            HstError::Feature(_) => "features",
            HstError::RankDeficiency { .. } | HstError::Fitting(_) => "fitting",
            HstError::Prediction(_) => "prediction",
            HstError::Output(_) => "output",
        }
    }
}

impl From<polars::error::PolarsError> for HstError {
    fn from(err: polars::error::PolarsError) -> Self {
        HstError::DataFormat(err.to_string())
    }
}

impl From<ndarray::ShapeError> for HstError {
    fn from(err: ndarray::ShapeError) -> Self {
        HstError::Feature(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HstError::DataFormat("missing column 'temperature'".to_string());
        assert_eq!(err.to_string(), "Data format error: missing column 'temperature'");

        let err = HstError::RankDeficiency { rank: 7, columns: 9 };
        assert_eq!(
            err.to_string(),
            "Rank deficiency: design matrix has rank 7 but 9 columns"
        );
    }

    #[test]
    fn test_error_from_polars_is_loading() {
        let err: HstError = polars::error::PolarsError::NoData("empty csv".into()).into();
        assert!(matches!(err, HstError::DataFormat(_)));
        assert_eq!(err.stage(), "loading");
    }

    #[test]
    fn test_error_stage() {
        assert_eq!(HstError::Feature(String::new()).stage(), "features");
        assert_eq!(HstError::Fitting(String::new()).stage(), "fitting");
        assert_eq!(HstError::RankDeficiency { rank: 0, columns: 1 }.stage(), "fitting");
        assert_eq!(HstError::Prediction(String::new()).stage(), "prediction");
        assert_eq!(HstError::Output(String::new()).stage(), "output");
    }
}
