//! Sample persistence.
//!
//! Every processed sample is appended to a record sink, one JSON object
//! per sample, so the persisted stream and the delivered callbacks are
//! always derived from the same sample set.

mod format;
mod writer;

pub use format::SampleRecord;
pub use writer::{JsonRecordWriter, MemorySink, RecordError, RecordSink};
