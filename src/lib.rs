//! # canfuzz - labeled CAN bus datasets
//!
//! Generates simulated CAN traffic for anomaly-detection experiments. Every
//! frame is labeled: normal frames come from a table of known signals,
//! injected frames use identifiers outside that table and random payloads.
//! A run always contains exactly the requested number of each.
//!
//! ## Quick Start
//!
//! ```rust
//! use canfuzz::{FrameGenerator, GeneratorConfig, Label};
//!
//! let config = GeneratorConfig::new().with_targets(3, 2).with_seed(42);
//! let frames: Vec<_> = FrameGenerator::new(config).unwrap().collect();
//!
//! assert_eq!(frames.len(), 5);
//! assert_eq!(frames.iter().filter(|f| f.label == Label::Injected).count(), 2);
//! ```
//!
//! Writing a dataset file:
//!
//! ```rust,no_run
//! use canfuzz::{generate_dataset, GeneratorConfig, LogProgress, DEFAULT_OUTPUT};
//!
//! let mut progress = LogProgress::new("Generating CAN dataset");
//! let report = generate_dataset(GeneratorConfig::default(), DEFAULT_OUTPUT, &mut progress)?;
//! println!("{} frames", report.counters.total());
//! # Ok::<(), canfuzz::CanfuzzError>(())
//! ```
//!
//! ## Modules
//!
//! - [`frame`]: Labeled frame record and row format
//! - [`signal`]: Signal table and payload sampling
//! - [`generator`]: Exact-count labeled frame generation
//! - [`timestamp`]: Timestamps and clocks
//! - [`dataset`]: CSV writer, reader and summaries
//! - [`manifest`]: Run manifest
//! - [`progress`]: Progress reporting

pub mod dataset;
pub mod error;
pub mod frame;
pub mod generator;
pub mod manifest;
pub mod progress;
pub mod signal;
pub mod timestamp;

// Re-exports for convenient access
pub use dataset::{
    generate_dataset, read_dataset, write_frames, DatasetReader, DatasetSummary, DatasetWriter,
    GenerationReport, DEFAULT_OUTPUT,
};
pub use error::{CanfuzzError, ConfigError, DatasetError, Result};
pub use frame::{CanFrame, Label};
pub use generator::{FrameGenerator, GeneratorConfig, RunCounters};
pub use manifest::DatasetManifest;
pub use progress::{LogProgress, NoProgress, ProgressReporter};
pub use signal::{Signal, SignalKind, SignalTable};
pub use timestamp::{Clock, Timestamp, Timing};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Data length code of every generated frame
pub const DATA_LENGTH: u8 = 8;
