//! Dataset file I/O.
//!
//! Rows are comma separated, newline terminated, without a header:
//!
//! ```text
//! 1706745600.000042,205,8,0A,F0,00,00,00,00,00,00,R
//! ```

use crate::error::{CanfuzzError, DatasetError};
use crate::frame::CanFrame;
use crate::generator::{FrameGenerator, GeneratorConfig, RunCounters};
use crate::progress::ProgressReporter;
use crate::timestamp::Timestamp;
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "Fuzzy_dataset.csv";

/// Writes frames as dataset rows.
pub struct DatasetWriter<W: Write> {
    writer: csv::Writer<W>,
    written: u64,
}

impl DatasetWriter<File> {
    /// Create (or truncate) the output file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| DatasetError::CreateFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> DatasetWriter<W> {
    /// Wrap any writer.
    pub fn from_writer(inner: W) -> Self {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(inner);
        Self { writer, written: 0 }
    }

    /// Append one row.
    pub fn write_frame(&mut self, frame: &CanFrame) -> Result<(), DatasetError> {
        self.writer
            .write_record(frame.to_row())
            .map_err(|source| DatasetError::WriteRecord {
                index: self.written,
                source,
            })?;
        self.written += 1;
        Ok(())
    }

    /// Rows written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush buffered rows and return the row count.
    pub fn finish(mut self) -> Result<u64, DatasetError> {
        self.writer.flush()?;
        Ok(self.written)
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, DatasetError> {
        self.writer
            .into_inner()
            .map_err(|e| DatasetError::Io(e.into_error()))
    }
}

/// Write every frame of an iterator, reporting progress.
pub fn write_frames<W, I>(
    writer: &mut DatasetWriter<W>,
    frames: I,
    progress: &mut dyn ProgressReporter,
) -> Result<u64, DatasetError>
where
    W: Write,
    I: IntoIterator<Item = CanFrame>,
{
    for frame in frames {
        writer.write_frame(&frame)?;
        progress.advance(writer.written());
    }
    Ok(writer.written())
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Output file.
    pub path: PathBuf,
    /// Frames produced per class.
    pub counters: RunCounters,
    /// Run start.
    pub started_at: DateTime<Utc>,
    /// Run end.
    pub finished_at: DateTime<Utc>,
}

/// Generate a full run and write it to `path`.
///
/// The run stops at the first creation or write error; rows already
/// written are left in place.
pub fn generate_dataset(
    config: GeneratorConfig,
    path: impl AsRef<Path>,
    progress: &mut dyn ProgressReporter,
) -> Result<GenerationReport, CanfuzzError> {
    let path = path.as_ref();
    let started_at = Utc::now();

    let mut generator = FrameGenerator::new(config)?;
    let total = generator.remaining();
    let mut writer = DatasetWriter::create(path)?;

    log::debug!("writing {} frames to {}", total, path.display());
    progress.start(total);
    let written = write_frames(&mut writer, generator.by_ref(), progress)
        .and_then(|_| writer.finish());
    progress.finish();
    written?;

    Ok(GenerationReport {
        path: path.to_path_buf(),
        counters: generator.counters(),
        started_at,
        finished_at: Utc::now(),
    })
}

/// Reads dataset rows back into frames.
pub struct DatasetReader<R: Read> {
    reader: csv::Reader<R>,
    record: StringRecord,
}

impl DatasetReader<File> {
    /// Open a dataset file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        Ok(Self::from_reader(File::open(path)?))
    }
}

impl<R: Read> DatasetReader<R> {
    /// Wrap any reader.
    pub fn from_reader(inner: R) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(inner);
        Self {
            reader,
            record: StringRecord::new(),
        }
    }

    /// Read the next frame, `None` at end of input.
    pub fn read_frame(&mut self) -> Result<Option<CanFrame>, DatasetError> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        let line = self.record.position().map(|p| p.line()).unwrap_or(0);
        CanFrame::from_row(self.record.iter())
            .map(Some)
            .map_err(|message| DatasetError::parse(line, message))
    }
}

impl<R: Read> Iterator for DatasetReader<R> {
    type Item = Result<CanFrame, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

/// Read a whole dataset file.
pub fn read_dataset(path: impl AsRef<Path>) -> Result<Vec<CanFrame>, DatasetError> {
    DatasetReader::open(path)?.collect()
}

/// Aggregate view of a dataset.
///
/// An empty summary counts as monotonic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Frames per class.
    pub counters: RunCounters,
    /// Frames per identifier.
    pub per_id: BTreeMap<u32, u64>,
    /// Timestamp of the first row.
    pub first_timestamp: Option<Timestamp>,
    /// Timestamp of the last row.
    pub last_timestamp: Option<Timestamp>,
    /// Whether timestamps never decrease.
    pub monotonic: bool,
}

impl Default for DatasetSummary {
    fn default() -> Self {
        Self {
            counters: RunCounters::default(),
            per_id: BTreeMap::new(),
            first_timestamp: None,
            last_timestamp: None,
            monotonic: true,
        }
    }
}

impl DatasetSummary {
    /// Summarize a sequence of frames.
    pub fn from_frames<'a>(frames: impl IntoIterator<Item = &'a CanFrame>) -> Self {
        let mut summary = Self::default();
        for frame in frames {
            summary.observe(frame);
        }
        summary
    }

    /// Stream a dataset file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let mut summary = Self::default();
        for frame in DatasetReader::open(path)? {
            summary.observe(&frame?);
        }
        Ok(summary)
    }

    fn observe(&mut self, frame: &CanFrame) {
        if frame.is_injected() {
            self.counters.injected += 1;
        } else {
            self.counters.normal += 1;
        }
        *self.per_id.entry(frame.id).or_insert(0) += 1;

        if let Some(last) = self.last_timestamp {
            if frame.timestamp < last {
                self.monotonic = false;
            }
        }
        self.first_timestamp.get_or_insert(frame.timestamp);
        self.last_timestamp = Some(frame.timestamp);
    }

    /// Number of rows.
    pub fn len(&self) -> u64 {
        self.counters.total()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Label;
    use crate::progress::{LogProgress, NoProgress};
    use crate::timestamp::Timing;
    use tempfile::NamedTempFile;

    fn frame(secs: i64, id: u32, label: Label) -> CanFrame {
        CanFrame::new(Timestamp::new(secs, 0), id, [1, 2, 3, 4, 5, 6, 7, 0xAB], label)
    }

    #[test]
    fn test_row_format() {
        let mut writer = DatasetWriter::from_writer(Vec::new());
        writer.write_frame(&frame(1_706_745_600, 0x2A0, Label::Injected)).unwrap();
        writer.write_frame(&frame(1_706_745_601, 0x100, Label::Normal)).unwrap();
        assert_eq!(writer.written(), 2);

        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "1706745600.000000,2A0,8,01,02,03,04,05,06,07,AB,T\n\
             1706745601.000000,100,8,01,02,03,04,05,06,07,AB,R\n"
        );
    }

    #[test]
    fn test_reader_parses_rows() {
        let text = "1.000001,100,8,01,00,00,00,00,00,00,00,R\n2.000000,2FF,8,FF,EE,DD,CC,BB,AA,99,88,T\n";
        let frames: Vec<CanFrame> = DatasetReader::from_reader(text.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].id, 0x100);
        assert_eq!(frames[0].timestamp, Timestamp::new(1, 1));
        assert_eq!(frames[1].data[0], 0xFF);
        assert_eq!(frames[1].label, Label::Injected);
    }

    #[test]
    fn test_reader_reports_line() {
        let text = "1.000000,100,8,01,00,00,00,00,00,00,00,R\n1.000000,100,8,01,00,R\n";
        let mut reader = DatasetReader::from_reader(text.as_bytes());
        assert!(reader.read_frame().unwrap().is_some());
        match reader.read_frame() {
            Err(DatasetError::Parse { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("expected 12 fields"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_generate_dataset_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = GeneratorConfig::new().with_targets(30, 20).with_seed(7);

        let report = generate_dataset(config, temp_file.path(), &mut NoProgress).unwrap();
        assert_eq!(report.counters, RunCounters { normal: 30, injected: 20 });
        assert!(report.finished_at >= report.started_at);

        let frames = read_dataset(temp_file.path()).unwrap();
        assert_eq!(frames.len(), 50);
        assert!(frames.iter().all(|f| f.dlc == 8));
    }

    #[test]
    fn test_generate_dataset_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let config = GeneratorConfig::new().with_targets(1, 1);

        let err = generate_dataset(config, &path, &mut NoProgress).unwrap_err();
        assert!(matches!(
            err,
            CanfuzzError::Dataset(DatasetError::CreateFile { .. })
        ));
    }

    #[test]
    fn test_generate_dataset_bad_config_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let config = GeneratorConfig::new().with_injected_ids(0x100, 0x100);

        let err = generate_dataset(config, &path, &mut NoProgress).unwrap_err();
        assert!(matches!(err, CanfuzzError::Config(_)));
        assert!(!path.exists());
    }

    #[derive(Default)]
    struct RecordingProgress {
        started: Option<u64>,
        last: u64,
        finished: bool,
    }

    impl ProgressReporter for RecordingProgress {
        fn start(&mut self, total: u64) {
            self.started = Some(total);
        }

        fn advance(&mut self, written: u64) {
            self.last = written;
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn test_generate_dataset_finishes_progress() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = GeneratorConfig::new().with_targets(4, 1).with_seed(2);

        let mut progress = RecordingProgress::default();
        generate_dataset(config, temp_file.path(), &mut progress).unwrap();
        assert_eq!(progress.started, Some(5));
        assert_eq!(progress.last, 5);
        assert!(progress.finished);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_generate_dataset_write_error_finishes_progress() {
        let path = Path::new("/dev/full");
        if !path.exists() {
            return;
        }
        let config = GeneratorConfig::new().with_targets(2_000, 500).with_seed(9);

        let mut progress = RecordingProgress::default();
        let err = generate_dataset(config, path, &mut progress).unwrap_err();
        assert!(matches!(err, CanfuzzError::Dataset(_)));
        assert_eq!(progress.started, Some(2_500));
        assert!(progress.finished);
    }

    #[test]
    fn test_summary_default_is_monotonic() {
        let summary = DatasetSummary::default();
        assert!(summary.monotonic);
        assert!(summary.is_empty());
        assert_eq!(summary, DatasetSummary::from_frames(std::iter::empty()));
    }

    #[test]
    fn test_summary() {
        let frames = vec![
            frame(10, 0x100, Label::Normal),
            frame(11, 0x250, Label::Injected),
            frame(11, 0x100, Label::Normal),
        ];
        let summary = DatasetSummary::from_frames(&frames);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary.counters.get(Label::Normal), 2);
        assert_eq!(summary.per_id[&0x100], 2);
        assert_eq!(summary.first_timestamp, Some(Timestamp::new(10, 0)));
        assert_eq!(summary.last_timestamp, Some(Timestamp::new(11, 0)));
        assert!(summary.monotonic);

        let backwards = vec![frame(11, 0x100, Label::Normal), frame(10, 0x100, Label::Normal)];
        assert!(!DatasetSummary::from_frames(&backwards).monotonic);
    }

    #[test]
    fn test_summary_from_path() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = GeneratorConfig::new()
            .with_targets(12, 8)
            .with_seed(3)
            .with_timing(Timing::Fixed {
                start: Timestamp::new(100, 0),
                interval_micros: 1_000,
            });
        generate_dataset(config, temp_file.path(), &mut LogProgress::new("test")).unwrap();

        let summary = DatasetSummary::from_path(temp_file.path()).unwrap();
        assert_eq!(summary.counters, RunCounters { normal: 12, injected: 8 });
        assert_eq!(summary.first_timestamp, Some(Timestamp::new(100, 0)));
        assert_eq!(summary.last_timestamp, Some(Timestamp::new(100, 19_000)));
        assert!(summary.monotonic);
    }
}
