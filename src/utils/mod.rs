//! File boundary utilities

pub mod data_loader;

pub use data_loader::{
    normalize_column_name, DataLoader, LoaderConfig, ResultWriter, StagedFile, OUTPUT_COLUMNS,
};
