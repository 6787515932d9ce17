//! Error types for canfuzz
//!
//! Generation itself cannot fail; everything here comes from configuration
//! checks done before a run or from the file I/O around it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for canfuzz operations
pub type Result<T> = std::result::Result<T, CanfuzzError>;

/// Main error type for canfuzz operations
#[derive(Error, Debug)]
pub enum CanfuzzError {
    /// Configuration rejected before generation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dataset file error
    #[error("{0}")]
    Dataset(#[from] DatasetError),
}

/// Errors found while validating a generator configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The two targets do not fit in one frame count
    #[error("Frame targets overflow: {normal_target} normal + {injected_target} injected")]
    TargetOverflow {
        normal_target: u64,
        injected_target: u64,
    },

    /// Normal frames were requested but no signal is defined
    #[error("Signal table is empty but {normal_target} normal frames were requested")]
    EmptySignalTable { normal_target: u64 },

    /// A fluctuating signal has `min > max`
    #[error("Signal 0x{id:X} has an empty range: {min}..={max}")]
    InvalidSignalRange { id: u32, min: u16, max: u16 },

    /// Injected identifier range is empty
    #[error("Injected identifier range is empty: 0x{min:X}..=0x{max:X}")]
    InvalidInjectedRange { min: u32, max: u32 },

    /// A known signal identifier lies inside the injected range
    #[error("Signal 0x{id:X} lies inside the injected identifier range 0x{min:X}..=0x{max:X}")]
    InjectedRangeOverlap { id: u32, min: u32, max: u32 },

    /// Signal table file could not be loaded
    #[error("Invalid signal table: {0}")]
    InvalidSignalFile(String),
}

/// Errors while writing or reading a dataset file
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Output file could not be created
    #[error("could not create file {}: {source}", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be written
    #[error("could not write record {index}: {source}")]
    WriteRecord {
        index: u64,
        #[source]
        source: csv::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error outside of a row write
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error (manifest)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed row
    #[error("Parse error at line {line}: {message}")]
    Parse { line: u64, message: String },
}

impl DatasetError {
    pub(crate) fn parse(line: u64, message: impl Into<String>) -> Self {
        DatasetError::Parse {
            line,
            message: message.into(),
        }
    }
}
