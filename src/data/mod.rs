//! Dataset loading: sources plus the process-lifetime cache.

pub mod cache;
pub mod source;

pub use cache::DatasetCache;
pub use source::{CsvSource, DEFAULT_DATASET_URL, FileSource, HttpSource, LoadConfig};
