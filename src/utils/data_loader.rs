//! Data loading and result writing
//!
//! The loader reads a delimited text file through polars, keeping every cell as
//! text so timestamp and number parsing follows one policy regardless of what the
//! CSV reader would infer. Cleaning (sort, interpolation, covariate drop) works on
//! typed [`RawObservation`]s and can be exercised without touching the filesystem.

use crate::data::{Observation, ObservationSeries, RawObservation};
use crate::error::{HstError, Result};
use crate::imputation::LinearInterpolator;
use crate::inference::ResultRecord;
use crate::training::FittedModel;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Normalised name of the timestamp column after renaming
pub const TS_COLUMN: &str = "ts";
/// Normalised name of the timestamp column in the input header
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const TEMPERATURE_COLUMN: &str = "temperature";
pub const ENSOLEILLEMENT_COLUMN: &str = "ensoleillement";
pub const DEPLACEMENT_COLUMN: &str = "deplacement";

/// Output header, in order
pub const OUTPUT_COLUMNS: [&str; 4] = ["ts", "deplacement", "pred_deplacement", "residu"];

/// Timestamp format used when writing results
pub const OUTPUT_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Formats carrying a UTC offset, tried after RFC 3339
const OFFSET_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

/// Minimum number of observations that must survive cleaning
pub const MIN_ROWS: usize = 2;

/// Configuration for [`DataLoader`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Field separator
    pub separator: u8,
    /// Lines to skip before the header row
    pub skip_rows: usize,
    /// Cell contents treated as missing (compared after trimming)
    pub null_values: Vec<String>,
    /// chrono formats tried in order for the timestamp column
    pub timestamp_formats: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            separator: b',',
            skip_rows: 0,
            null_values: [
                "NAN", "NaN", "nan", "-NaN", "-nan", "NA", "N/A", "n/a", "#N/A", "#N/A N/A",
                "#NA", "<NA>", "NULL", "null", "None", "1.#IND", "-1.#IND", "1.#QNAN",
                "-1.#QNAN", "",
            ]
            .iter()
                .map(|s| s.to_string())
                .collect(),
            timestamp_formats: [
                "%Y-%m-%d %H:%M:%S%.f",
                "%Y-%m-%dT%H:%M:%S%.f",
                "%Y-%m-%d %H:%M",
                "%Y-%m-%dT%H:%M",
                "%Y/%m/%d %H:%M:%S",
                "%d/%m/%Y %H:%M:%S",
                "%d/%m/%Y %H:%M",
                "%Y-%m-%d",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    /// Replace the missing-value markers. `NAN` is always kept.
    pub fn with_null_values(mut self, values: Vec<String>) -> Self {
        self.null_values = values;
        if !self.null_values.iter().any(|v| v == "NAN") {
            self.null_values.push("NAN".to_string());
        }
        self
    }

    /// Try `format` before the built-in timestamp formats
    pub fn with_timestamp_format(mut self, format: &str) -> Self {
        self.timestamp_formats.insert(0, format.to_string());
        self
    }

    fn is_null(&self, cell: &str) -> bool {
        self.null_values.iter().any(|v| v == cell)
    }
}

/// Normalise a header name: trim surrounding whitespace and lower-case.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Loads and cleans the measurement series.
pub struct DataLoader {
    config: LoaderConfig,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            config: LoaderConfig::default(),
        }
    }

    pub fn with_config(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Read and clean a file into an [`ObservationSeries`]
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<ObservationSeries> {
        let raw = self.read_raw(path)?;
        self.clean(raw)
    }

    /// Read the file into typed but uncleaned rows, in file order
    pub fn read_raw<P: AsRef<Path>>(&self, path: P) -> Result<Vec<RawObservation>> {
        let path = path.as_ref();
        let df = self.read_frame(path)?;
        info!(path = %path.display(), rows = df.height(), cols = df.width(), "read input file");
        self.frame_to_raw(&df)
    }

    fn read_frame(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| {
            HstError::DataFormat(format!("cannot open '{}': {}", path.display(), e))
        })?;

        let parse_opts = CsvParseOptions::default()
            .with_separator(self.config.separator)
            .with_quote_char(Some(b'"'))
            .with_null_values(Some(NullValues::AllColumns(
                self.config
                    .null_values
                    .iter()
                    .map(|v| PlSmallStr::from(v.as_str()))
                    .collect(),
            )));

        // Schema inference disabled: every column is read as text
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_skip_rows(self.config.skip_rows)
            .with_infer_schema_length(Some(0))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?;

        Ok(df)
    }

    /// Map normalised column names to the names as they appear in `df`
    fn column_index(df: &DataFrame) -> Result<HashMap<String, String>> {
        let mut index = HashMap::new();
        for name in df.get_column_names() {
            let mut normalized = normalize_column_name(name.as_str());
            if normalized == TIMESTAMP_COLUMN {
                normalized = TS_COLUMN.to_string();
            }
            if let Some(previous) = index.insert(normalized.clone(), name.to_string()) {
                return Err(HstError::DataFormat(format!(
                    "columns '{}' and '{}' both normalise to '{}'",
                    previous, name, normalized
                )));
            }
        }
        Ok(index)
    }

    fn text_column(df: &DataFrame, index: &HashMap<String, String>, key: &str) -> Result<Vec<Option<String>>> {
        let original = index.get(key).ok_or_else(|| {
            let shown = if key == TS_COLUMN { "TIMESTAMP" } else { key };
            HstError::DataFormat(format!("missing required column '{}'", shown))
        })?;

        let series = df
            .column(original)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let values = series
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        Ok(values)
    }

    fn frame_to_raw(&self, df: &DataFrame) -> Result<Vec<RawObservation>> {
        let index = Self::column_index(df)?;

        let ts = Self::text_column(df, &index, TS_COLUMN)?;
        let temperature = Self::text_column(df, &index, TEMPERATURE_COLUMN)?;
        let ensoleillement = Self::text_column(df, &index, ENSOLEILLEMENT_COLUMN)?;
        let deplacement = Self::text_column(df, &index, DEPLACEMENT_COLUMN)?;

        let mut rows = Vec::with_capacity(ts.len());
        for i in 0..ts.len() {
            let cell = ts[i].as_deref().map(clean_cell).unwrap_or_default();
            if self.config.is_null(cell) {
                return Err(HstError::DataFormat(format!(
                    "row {}: missing timestamp",
                    i + 1
                )));
            }
            let stamp = self.parse_timestamp(cell).ok_or_else(|| {
                HstError::DataFormat(format!("row {}: cannot parse timestamp '{}'", i + 1, cell))
            })?;

            rows.push(RawObservation::new(
                stamp,
                self.parse_measurement(temperature[i].as_deref(), TEMPERATURE_COLUMN, i)?,
                self.parse_measurement(ensoleillement[i].as_deref(), ENSOLEILLEMENT_COLUMN, i)?,
                self.parse_measurement(deplacement[i].as_deref(), DEPLACEMENT_COLUMN, i)?,
            ));
        }

        Ok(rows)
    }

    /// Parse a timestamp with the configured formats. Date-only formats map to midnight.
    ///
    /// Values carrying a UTC offset (`Z`, `+01:00`, `+0100`) are converted to UTC.
    pub fn parse_timestamp(&self, cell: &str) -> Option<NaiveDateTime> {
        let cell = clean_cell(cell);
        self.config
            .timestamp_formats
            .iter()
            .find_map(|fmt| {
                NaiveDateTime::parse_from_str(cell, fmt).ok().or_else(|| {
                    NaiveDate::parse_from_str(cell, fmt)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
            })
            .or_else(|| {
                DateTime::parse_from_rfc3339(cell)
                    .ok()
                    .or_else(|| {
                        OFFSET_TIMESTAMP_FORMATS
                            .iter()
                            .find_map(|fmt| DateTime::parse_from_str(cell, fmt).ok())
                    })
                    .map(|dt| dt.naive_utc())
            })
    }

    fn parse_measurement(&self, cell: Option<&str>, column: &str, row: usize) -> Result<Option<f64>> {
        let cell = match cell.map(clean_cell) {
            None => return Ok(None),
            Some(c) if self.config.is_null(c) => return Ok(None),
            Some(c) => c,
        };

        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            Ok(_) => Ok(None),
            Err(_) => Err(HstError::DataFormat(format!(
                "row {}: column '{}' holds non-numeric value '{}'",
                row + 1,
                column,
                cell
            ))),
        }
    }

    /// Clean raw rows into an [`ObservationSeries`].
    ///
    /// Steps, in order:
    /// 1. stable sort by timestamp;
    /// 2. interpolate `deplacement` over the full sorted axis, boundary gaps take the
    ///    nearest known value;
    /// 3. drop rows missing `temperature` or `ensoleillement`;
    /// 4. require at least [`MIN_ROWS`] rows.
    pub fn clean(&self, mut raw: Vec<RawObservation>) -> Result<ObservationSeries> {
        let n_raw = raw.len();
        if n_raw == 0 {
            return Err(HstError::DataFormat("input has no data rows".to_string()));
        }

        raw.sort_by_key(|r| r.ts);

        let targets: Vec<Option<f64>> = raw.iter().map(|r| r.deplacement).collect();
        let n_filled = LinearInterpolator::count_missing(&targets);
        let filled = LinearInterpolator::new().interpolate(&targets).map_err(|_| {
            HstError::DataFormat(format!(
                "column '{}' has no values to interpolate from",
                DEPLACEMENT_COLUMN
            ))
        })?;

        let observations: Vec<Observation> = raw
            .iter()
            .zip(filled)
            .filter_map(|(r, deplacement)| match (r.temperature, r.ensoleillement) {
                (Some(temperature), Some(ensoleillement)) => Some(Observation {
                    ts: r.ts,
                    temperature,
                    ensoleillement,
                    deplacement,
                }),
                _ => None,
            })
            .collect();

        let n_dropped = n_raw - observations.len();
        if n_dropped > 0 {
            warn!(dropped = n_dropped, "dropped rows with missing temperature or ensoleillement");
        }
        debug!(rows = n_raw, interpolated = n_filled, kept = observations.len(), "cleaned series");

        if observations.len() < MIN_ROWS {
            return Err(HstError::DataFormat(format!(
                "only {} valid rows after cleaning, need at least {}",
                observations.len(),
                MIN_ROWS
            )));
        }

        Ok(ObservationSeries::from_sorted(observations))
    }
}

fn clean_cell(cell: &str) -> &str {
    cell.trim().trim_matches('"').trim()
}

/// Persists pipeline results
pub struct ResultWriter;

impl ResultWriter {
    /// Build the output frame: `ts, deplacement, pred_deplacement, residu`
    pub fn to_frame(records: &[ResultRecord]) -> Result<DataFrame> {
        let ts: Vec<String> = records
            .iter()
            .map(|r| r.ts.format(OUTPUT_TS_FORMAT).to_string())
            .collect();
        let deplacement: Vec<f64> = records.iter().map(|r| r.deplacement).collect();
        let predicted: Vec<f64> = records.iter().map(|r| r.pred_deplacement).collect();
        let residu: Vec<f64> = records.iter().map(|r| r.residu).collect();

        DataFrame::new(vec![
            Column::new(OUTPUT_COLUMNS[0].into(), ts),
            Column::new(OUTPUT_COLUMNS[1].into(), deplacement),
            Column::new(OUTPUT_COLUMNS[2].into(), predicted),
            Column::new(OUTPUT_COLUMNS[3].into(), residu),
        ])
        .map_err(|e| HstError::Output(e.to_string()))
    }

    /// Render the results as CSV text
    pub fn csv_bytes(records: &[ResultRecord]) -> Result<Vec<u8>> {
        let mut df = Self::to_frame(records)?;
        let mut buf = Vec::new();
        CsvWriter::new(&mut buf)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| HstError::Output(e.to_string()))?;
        Ok(buf)
    }

    /// Render the fitted model (coefficients and fit statistics) as JSON
    pub fn model_json(model: &FittedModel) -> Result<String> {
        serde_json::to_string_pretty(model).map_err(|e| HstError::Output(e.to_string()))
    }

    /// Save results to CSV
    pub fn save_csv<P: AsRef<Path>>(records: &[ResultRecord], path: P) -> Result<()> {
        let bytes = Self::csv_bytes(records)?;
        let path = path.as_ref();
        Self::stage(path, &bytes)?.commit()?;
        info!(path = %path.display(), rows = records.len(), "wrote results");
        Ok(())
    }

    /// Save the fitted model as JSON
    pub fn save_model_json<P: AsRef<Path>>(model: &FittedModel, path: P) -> Result<()> {
        let json = Self::model_json(model)?;
        Self::stage(path.as_ref(), json.as_bytes())?.commit()
    }

    /// Write `bytes` to a temporary file next to `path`.
    ///
    /// Nothing appears at `path` until [`StagedFile::commit`]; dropping the
    /// staged file removes it.
    pub fn stage(path: &Path, bytes: &[u8]) -> Result<StagedFile> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)
            .map_err(|e| HstError::Output(format!("cannot write '{}': {}", path.display(), e)))?;
        file.write_all(bytes)
            .and_then(|_| file.as_file().sync_all())
            .map_err(|e| HstError::Output(format!("cannot write '{}': {}", path.display(), e)))?;

        Ok(StagedFile {
            file,
            target: path.to_path_buf(),
        })
    }
}

/// A fully written output waiting to be moved into place
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the temporary file onto its target path
    pub fn commit(self) -> Result<()> {
        let target = self.target;
        self.file.persist(&target).map_err(|e| {
            HstError::Output(format!("cannot write '{}': {}", target.display(), e.error))
        })?;
        debug!(path = %target.display(), "committed output");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn create_test_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_load_normalises_headers_and_sorts() {
        let file = create_test_csv(&[
            " TIMESTAMP ,Temperature, ENSOLEILLEMENT,Deplacement ",
            "2024-06-01 02:00:00,12.0,0.0,1.2",
            "2024-06-01 00:00:00,10.0,0.0,1.0",
            "2024-06-01 01:00:00,11.0,0.0,1.1",
        ]);

        let series = DataLoader::new().load(file.path()).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.timestamps(), vec![ts(1, 0), ts(1, 1), ts(1, 2)]);
        assert_eq!(series.targets().to_vec(), vec![1.0, 1.1, 1.2]);
    }

    #[test]
    fn test_nan_marker_is_missing() {
        let file = create_test_csv(&[
            "TIMESTAMP,temperature,ensoleillement,deplacement",
            "2024-06-01 00:00:00,10.0,1.0,1.0",
            "2024-06-01 01:00:00,11.0,1.0,NAN",
            "2024-06-01 02:00:00,12.0,1.0,3.0",
        ]);

        let series = DataLoader::new().load(file.path()).unwrap();
        assert_eq!(series.targets().to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_quoted_cells() {
        let file = create_test_csv(&[
            "\"TIMESTAMP\",\"temperature\",\"ensoleillement\",\"deplacement\"",
            "\"2024-06-01 00:00:00\",10.0,1.0,\"NAN\"",
            "\"2024-06-01 01:00:00\",11.0,1.0,4.0",
        ]);

        let series = DataLoader::new().load(file.path()).unwrap();
        assert_eq!(series.targets().to_vec(), vec![4.0, 4.0]);
    }

    #[test]
    fn test_missing_column_is_data_format_error() {
        let file = create_test_csv(&[
            "TIMESTAMP,temperature,deplacement",
            "2024-06-01 00:00:00,10.0,1.0",
        ]);

        let err = DataLoader::new().load(file.path()).unwrap_err();
        assert!(matches!(err, HstError::DataFormat(ref m) if m.contains("ensoleillement")));
    }

    #[test]
    fn test_bad_timestamp_is_data_format_error() {
        let file = create_test_csv(&[
            "TIMESTAMP,temperature,ensoleillement,deplacement",
            "2024-06-01 00:00:00,10.0,1.0,1.0",
            "yesterday,11.0,1.0,2.0",
        ]);

        let err = DataLoader::new().load(file.path()).unwrap_err();
        assert!(matches!(err, HstError::DataFormat(ref m) if m.contains("row 2")));
    }

    #[test]
    fn test_non_numeric_measurement_is_rejected() {
        let file = create_test_csv(&[
            "TIMESTAMP,temperature,ensoleillement,deplacement",
            "2024-06-01 00:00:00,warm,1.0,1.0",
            "2024-06-01 01:00:00,11.0,1.0,2.0",
        ]);

        let err = DataLoader::new().load(file.path()).unwrap_err();
        assert!(matches!(err, HstError::DataFormat(ref m) if m.contains("temperature")));
    }

    #[test]
    fn test_semicolon_separator_and_skip_rows() {
        let file = create_test_csv(&[
            "logger metadata line",
            "TIMESTAMP;temperature;ensoleillement;deplacement",
            "2024-06-01T00:00;10.0;1.0;1.0",
            "2024-06-01T01:00;11.0;1.0;2.0",
        ]);

        let config = LoaderConfig::new().with_separator(b';').with_skip_rows(1);
        let series = DataLoader::with_config(config).load(file.path()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.timestamps()[1], ts(1, 1));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let loader = DataLoader::new();
        assert_eq!(loader.parse_timestamp("2024-06-01 05:00:00"), Some(ts(1, 5)));
        assert_eq!(loader.parse_timestamp("2024-06-01T05:00:00"), Some(ts(1, 5)));
        assert_eq!(loader.parse_timestamp("01/06/2024 05:00"), Some(ts(1, 5)));
        assert_eq!(loader.parse_timestamp("2024-06-02"), Some(ts(2, 0)));
        assert_eq!(loader.parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_parse_timestamp_with_offset_is_utc() {
        let loader = DataLoader::new();
        assert_eq!(loader.parse_timestamp("2024-06-01T05:00:00Z"), Some(ts(1, 5)));
        assert_eq!(loader.parse_timestamp("2024-06-01T07:00:00+02:00"), Some(ts(1, 5)));
        assert_eq!(loader.parse_timestamp("2024-06-01 06:00:00+01:00"), Some(ts(1, 5)));
        assert_eq!(loader.parse_timestamp("2024-06-01 06:00:00+0100"), Some(ts(1, 5)));
    }

    #[test]
    fn test_load_offset_timestamps() {
        let file = create_test_csv(&[
            "TIMESTAMP,temperature,ensoleillement,deplacement",
            "2024-06-01T00:00:00Z,10.0,1.0,1.0",
            "2024-06-01 02:00:00+01:00,11.0,1.0,2.0",
        ]);

        let series = DataLoader::new().load(file.path()).unwrap();
        assert_eq!(series.timestamps(), vec![ts(1, 0), ts(1, 1)]);
    }

    #[test]
    fn test_common_missing_markers() {
        let file = create_test_csv(&[
            "TIMESTAMP,temperature,ensoleillement,deplacement",
            "2024-06-01 00:00:00,10.0,1.0,1.0",
            "2024-06-01 01:00:00,11.0,1.0,N/A",
            "2024-06-01 02:00:00,12.0,1.0,NULL",
            "2024-06-01 03:00:00,13.0,1.0,null",
            "2024-06-01 04:00:00,14.0,1.0,#N/A",
            "2024-06-01 05:00:00,15.0,1.0,None",
            "2024-06-01 06:00:00,16.0,1.0,7.0",
        ]);

        let series = DataLoader::new().load(file.path()).unwrap();
        assert_eq!(series.targets().to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_clean_drops_rows_after_interpolating() {
        // The middle row lacks temperature but its neighbours still interpolate
        // over the full axis, so the gap at index 2 is filled from positions 1 and 3.
        let raw = vec![
            RawObservation::new(ts(1, 0), Some(10.0), Some(0.0), Some(0.0)),
            RawObservation::new(ts(1, 1), None, Some(0.0), Some(2.0)),
            RawObservation::new(ts(1, 2), Some(12.0), Some(0.0), None),
            RawObservation::new(ts(1, 3), Some(13.0), Some(0.0), Some(6.0)),
        ];

        let series = DataLoader::new().clean(raw).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.targets().to_vec(), vec![0.0, 4.0, 6.0]);
        assert!(series.iter().all(|o| o.ts != ts(1, 1)));
    }

    #[test]
    fn test_clean_stable_sort_on_ties() {
        let raw = vec![
            RawObservation::new(ts(1, 1), Some(1.0), Some(0.0), Some(10.0)),
            RawObservation::new(ts(1, 0), Some(2.0), Some(0.0), Some(20.0)),
            RawObservation::new(ts(1, 1), Some(3.0), Some(0.0), Some(30.0)),
        ];

        let series = DataLoader::new().clean(raw).unwrap();
        let temps: Vec<f64> = series.iter().map(|o| o.temperature).collect();
        assert_eq!(temps, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn test_clean_all_displacement_missing() {
        let raw = vec![
            RawObservation::new(ts(1, 0), Some(1.0), Some(0.0), None),
            RawObservation::new(ts(1, 1), Some(2.0), Some(0.0), None),
        ];
        let err = DataLoader::new().clean(raw).unwrap_err();
        assert!(matches!(err, HstError::DataFormat(ref m) if m.contains("deplacement")));
    }

    #[test]
    fn test_clean_too_few_rows() {
        let raw = vec![
            RawObservation::new(ts(1, 0), Some(1.0), Some(0.0), Some(1.0)),
            RawObservation::new(ts(1, 1), Some(2.0), None, Some(2.0)),
        ];
        let err = DataLoader::new().clean(raw).unwrap_err();
        assert!(matches!(err, HstError::DataFormat(_)));
    }

    #[test]
    fn test_save_csv_header_and_rows() {
        let records = vec![
            ResultRecord { ts: ts(1, 0), deplacement: 1.0, pred_deplacement: 0.5, residu: 0.5 },
            ResultRecord { ts: ts(1, 1), deplacement: 2.0, pred_deplacement: 2.5, residu: -0.5 },
        ];

        let file = NamedTempFile::new().unwrap();
        ResultWriter::save_csv(&records, file.path()).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("ts,deplacement,pred_deplacement,residu"));
        let first = lines.next().unwrap();
        assert!(first.starts_with("2024-06-01 00:00:00,"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_staged_file_appears_only_on_commit() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("out.csv");

        let staged = ResultWriter::stage(&target, b"a,b\n").unwrap();
        assert!(!target.exists());
        drop(staged);
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        ResultWriter::stage(&target, b"a,b\n").unwrap().commit().unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "a,b\n");
    }

    #[test]
    fn test_stage_into_missing_directory_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("no_such_dir").join("model.json");

        let err = ResultWriter::stage(&target, b"{}").unwrap_err();
        assert!(matches!(err, HstError::Output(ref m) if m.contains("model.json")));
        assert_eq!(err.stage(), "output");
    }
}
