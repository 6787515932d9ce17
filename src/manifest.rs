//! Run manifest describing a generated dataset.
//!
//! The manifest sits next to the CSV file (`<file>.manifest.json`) and
//! records what was asked for and what was produced.

use crate::dataset::GenerationReport;
use crate::error::DatasetError;
use crate::generator::{GeneratorConfig, RunCounters};
use crate::signal::SignalTable;
use crate::timestamp::Timing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Dataset manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Dataset file name.
    pub name: String,
    /// Crate version that produced the file.
    pub generator_version: String,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
    /// Run duration in milliseconds.
    pub duration_ms: u64,
    /// Random seed used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Requested normal frames.
    pub normal_target: u64,
    /// Requested injected frames.
    pub injected_target: u64,
    /// Injected identifier range (inclusive).
    pub injected_ids: (u32, u32),
    /// Timestamp source.
    pub timing: Timing,
    /// Legitimate signals.
    pub signals: SignalTable,
    /// Frames actually produced.
    pub produced: RunCounters,
}

impl DatasetManifest {
    /// Build from the configuration and outcome of a run.
    pub fn from_run(config: &GeneratorConfig, report: &GenerationReport) -> Self {
        let name = report
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let duration_ms = (report.finished_at - report.started_at)
            .num_milliseconds()
            .max(0) as u64;

        Self {
            name,
            generator_version: crate::VERSION.to_string(),
            generated_at: report.finished_at,
            duration_ms,
            seed: config.seed,
            normal_target: config.normal_target,
            injected_target: config.injected_target,
            injected_ids: (config.injected_id_min, config.injected_id_max),
            timing: config.timing,
            signals: config.signals.clone(),
            produced: report.counters,
        }
    }

    /// Injected share of the produced frames.
    pub fn injected_ratio(&self) -> f64 {
        let total = self.produced.total();
        if total == 0 {
            0.0
        } else {
            self.produced.injected as f64 / total as f64
        }
    }

    /// Manifest location for a dataset file.
    pub fn path_for(dataset: impl AsRef<Path>) -> PathBuf {
        let mut name = dataset.as_ref().as_os_str().to_owned();
        name.push(".manifest.json");
        PathBuf::from(name)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to JSON file.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load from JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::Timestamp;
    use chrono::Duration;
    use tempfile::NamedTempFile;

    fn report() -> GenerationReport {
        let finished_at = Utc::now();
        GenerationReport {
            path: PathBuf::from("/data/Fuzzy_dataset.csv"),
            counters: RunCounters {
                normal: 3,
                injected: 1,
            },
            started_at: finished_at - Duration::milliseconds(1500),
            finished_at,
        }
    }

    #[test]
    fn test_manifest_from_run() {
        let config = GeneratorConfig::new().with_targets(3, 1).with_seed(42);
        let manifest = DatasetManifest::from_run(&config, &report());

        assert_eq!(manifest.name, "Fuzzy_dataset.csv");
        assert_eq!(manifest.duration_ms, 1500);
        assert_eq!(manifest.seed, Some(42));
        assert_eq!(manifest.injected_ids, (0x206, 0x2FF));
        assert_eq!(manifest.signals.len(), 8);
        assert!((manifest.injected_ratio() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_manifest_path() {
        assert_eq!(
            DatasetManifest::path_for("out/Fuzzy_dataset.csv"),
            PathBuf::from("out/Fuzzy_dataset.csv.manifest.json")
        );
    }

    #[test]
    fn test_manifest_json() {
        let config = GeneratorConfig::new()
            .with_targets(3, 1)
            .with_timing(Timing::Fixed {
                start: Timestamp::new(1_706_745_600, 0),
                interval_micros: 500,
            });
        let manifest = DatasetManifest::from_run(&config, &report());

        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"name\": \"Fuzzy_dataset.csv\""));
        assert!(json.contains("\"mode\": \"fixed\""));
        assert!(json.contains("\"start\": \"1706745600.000000\""));
        assert!(!json.contains("\"seed\""));

        let temp_file = NamedTempFile::new().unwrap();
        manifest.to_json_file(temp_file.path()).unwrap();
        let loaded = DatasetManifest::from_json_file(temp_file.path()).unwrap();
        assert_eq!(loaded.produced, manifest.produced);
        assert_eq!(loaded.signals, manifest.signals);
        assert_eq!(loaded.timing, manifest.timing);
    }
}
