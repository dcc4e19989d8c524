use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read truth file {path:?}: {source}")]
    TruthFileUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed truth file line {line_number}: '{line}'")]
    MalformedTruthLine { line_number: usize, line: String },

    #[error("Failed to read sample file {path:?}: {source}")]
    SampleUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}
