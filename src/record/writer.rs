//! Record sinks.
//!
//! The pipeline hands every processed sample to a sink, append-only and
//! in order. Sink failures are the sink's to report; they never touch the
//! pipeline's in-memory state.

use super::SampleRecord;
use crate::capture::Sample;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while persisting records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("record encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Append-only destination for processed samples.
///
/// `write` is called exactly once per processed sample and must not drop
/// or reorder. `close` flushes buffered output and is idempotent.
pub trait RecordSink {
    /// Appends one sample's record.
    fn write(&mut self, sample: &Sample) -> Result<(), RecordError>;

    /// Flushes and closes the sink. Safe to call more than once.
    fn close(&mut self) -> Result<(), RecordError>;
}

struct OpenFile {
    out: BufWriter<File>,
    records_written: u64,
}

/// Sink writing one JSON array of sample records to a file.
pub struct JsonRecordWriter {
    path: PathBuf,
    file: Option<OpenFile>,
}

impl JsonRecordWriter {
    /// Creates the record file and writes the array opening.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref().to_path_buf();
        let mut out = BufWriter::new(File::create(&path)?);
        out.write_all(b"[")?;
        tracing::info!(path = %path.display(), "Record file opened");
        Ok(Self {
            path,
            file: Some(OpenFile {
                out,
                records_written: 0,
            }),
        })
    }

    /// Returns the number of records written so far.
    pub fn records_written(&self) -> u64 {
        self.file.as_ref().map_or(0, |f| f.records_written)
    }

    /// Returns the record file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonRecordWriter {
    fn write(&mut self, sample: &Sample) -> Result<(), RecordError> {
        let file = match self.file.as_mut() {
            Some(file) => file,
            None => {
                return Err(RecordError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    "record file already closed",
                )))
            }
        };

        let record = SampleRecord::from(sample);
        if file.records_written > 0 {
            file.out.write_all(b",\n")?;
        }
        serde_json::to_writer(&mut file.out, &record)?;
        file.records_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), RecordError> {
        if let Some(mut file) = self.file.take() {
            file.out.write_all(b"]")?;
            file.out.flush()?;
            tracing::info!(
                path = %self.path.display(),
                records = file.records_written,
                "Record file closed"
            );
        }
        Ok(())
    }
}

impl Drop for JsonRecordWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "Failed to close record file on drop");
        }
    }
}

/// In-memory sink for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<SampleRecord>,
    closed: bool,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the accumulated records.
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Returns true once the sink has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RecordSink for MemorySink {
    fn write(&mut self, sample: &Sample) -> Result<(), RecordError> {
        self.records.push(SampleRecord::from(sample));
        Ok(())
    }

    fn close(&mut self) -> Result<(), RecordError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_at(t: f64) -> Sample {
        Sample::new(t, 1000.0 + t, 0.9, 0.45, 0.08, 2.5)
    }

    #[test]
    fn test_json_writer_produces_valid_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let mut writer = JsonRecordWriter::create(&path).unwrap();
        for i in 0..5 {
            writer.write(&sample_at(i as f64)).unwrap();
        }
        writer.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<SampleRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed[3].timestamp, 3.0);
    }

    #[test]
    fn test_empty_file_is_valid_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");

        let mut writer = JsonRecordWriter::create(&path).unwrap();
        writer.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<SampleRecord> = serde_json::from_str(&content).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let mut writer = JsonRecordWriter::create(&path).unwrap();
        writer.write(&sample_at(0.0)).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches(']').count(), 1);
    }

    #[test]
    fn test_write_after_close_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let mut writer = JsonRecordWriter::create(&path).unwrap();
        writer.close().unwrap();
        assert!(writer.write(&sample_at(0.0)).is_err());
    }

    #[test]
    fn test_memory_sink_counts_writes() {
        let mut sink = MemorySink::new();
        for i in 0..3 {
            sink.write(&sample_at(i as f64)).unwrap();
        }
        sink.close().unwrap();

        assert_eq!(sink.records().len(), 3);
        assert!(sink.is_closed());
    }
}
