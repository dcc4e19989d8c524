//! Dataset samples fed to the device.
//!
//! The script engine accepts any iterator of [`Sample`] results, so tests and
//! callers can hand it an in-memory `Vec`. [`TruthFileDataset`] is the on-disk
//! layout used by the runner: a directory of sample files plus a truth file
//! with one `file_name,class` line per sample.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use log::debug;
use serde::Deserialize;

use crate::errors::{DatasetError, DatasetResult};

/// One dataset entry: the bytes to upload, its true class and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub file_name: String,
    pub true_class: usize,
    pub payload: Vec<u8>,
}

impl Sample {
    pub fn new(file_name: impl Into<String>, true_class: usize, payload: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            true_class,
            payload,
        }
    }
}

/// Truth file entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TruthEntry {
    pub file_name: String,
    pub true_class: usize,
}

/// Lazily reads the samples listed in a truth file.
///
/// Sample files are only read when the iterator reaches them. The iterator is
/// finite and not restartable.
pub struct TruthFileDataset {
    directory: PathBuf,
    entries: std::vec::IntoIter<TruthEntry>,
}

impl TruthFileDataset {
    /// Opens `truth_file` (relative paths resolve inside `directory`).
    pub fn open(directory: impl AsRef<Path>, truth_file: impl AsRef<Path>) -> DatasetResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        let truth_path = directory.join(truth_file);
        let content =
            fs::read_to_string(&truth_path).map_err(|source| DatasetError::TruthFileUnreadable {
                path: truth_path.clone(),
                source,
            })?;

        let entries = parse_truth(&content)?;
        debug!("Read {} entries from {:?}", entries.len(), truth_path);

        Ok(Self {
            directory,
            entries: entries.into_iter(),
        })
    }

    /// Entries not yet read.
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

impl Iterator for TruthFileDataset {
    type Item = DatasetResult<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        let path = self.directory.join(&entry.file_name);
        Some(
            fs::read(&path)
                .map(|payload| Sample::new(entry.file_name, entry.true_class, payload))
                .map_err(|source| DatasetError::SampleUnreadable { path, source }),
        )
    }
}

/// Parses truth file content as headerless `file_name,class` CSV records.
/// Blank lines and `#` comments are skipped; quoted file names may contain commas.
pub fn parse_truth(content: &str) -> DatasetResult<Vec<TruthEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut entries = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| DatasetError::MalformedTruthLine {
            line_number: e.position().map_or(0, |position| position.line() as usize),
            line: e.to_string(),
        })?;

        let malformed = || DatasetError::MalformedTruthLine {
            line_number: record
                .position()
                .map_or(0, |position| position.line() as usize),
            line: record.iter().collect::<Vec<_>>().join(","),
        };

        if record.len() != 2 {
            return Err(malformed());
        }
        let entry: TruthEntry = record.deserialize(None).map_err(|_| malformed())?;
        if entry.file_name.is_empty() {
            return Err(malformed());
        }
        entries.push(entry);
    }

    Ok(entries)
}
