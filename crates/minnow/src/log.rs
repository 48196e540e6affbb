// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only record log
//!
//! The log file is the durable source of truth: an ordered JSON-lines
//! sequence of records, modified only by whole-batch appends and by the
//! compactor's atomic replace. Front-to-back replay always yields the
//! canonical state of some prefix of accepted operations.

use crate::error::StoreError;
use crate::record::Record;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// On-disk ordered sequence of records
pub struct AppendLog {
    path: PathBuf,
    file: File,
}

impl AppendLog {
    /// Open or create the log file at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Get the path to the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the log file in bytes
    pub fn len_bytes(&self) -> Result<u64, StoreError> {
        Ok(self.file.metadata()?.len())
    }

    /// Append all records as one contiguous write.
    ///
    /// The batch is encoded into a single buffer, written with one
    /// `write_all`, and fsync'd before returning. On error the caller
    /// must assume none of the batch became durable.
    pub fn append_batch(&mut self, records: &[Record]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::with_capacity(records.len() * 64);
        for record in records {
            buf.extend_from_slice(record.to_line()?.as_bytes());
            buf.push(b'\n');
        }

        self.file.write_all(&buf)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Iterate the log from the start, decoding records until end-of-file.
    ///
    /// A record that fails to decode is yielded as an error but does not
    /// stop the iterator; whether to skip or abort is the caller's policy.
    pub fn read_all(&self) -> Result<RecordIter, StoreError> {
        RecordIter::new(&self.path)
    }

    /// Atomically replace the entire log contents with exactly `records`.
    ///
    /// Data is written and synced to a sibling `.tmp` path first; the
    /// rename is the single atomic visibility point, so a reader never
    /// observes a half-written log. Returns the new file length.
    pub fn replace_with(&mut self, records: &[Record]) -> Result<u64, StoreError> {
        let tmp_path = tmp_sibling(&self.path);
        {
            let mut tmp = File::create(&tmp_path)?;
            let mut buf = Vec::new();
            for record in records {
                buf.extend_from_slice(record.to_line()?.as_bytes());
                buf.push(b'\n');
            }
            tmp.write_all(&buf)?;
            tmp.sync_all()?;
        }

        fs::rename(&tmp_path, &self.path)?;

        // The rename left the append handle pointing at the old inode.
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        Ok(self.file.metadata()?.len())
    }
}

/// Sibling temp path, same directory so the rename stays on one filesystem
fn tmp_sibling(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Iterator over log records with line and position tracking
pub struct RecordIter {
    reader: Option<BufReader<File>>,
    line_number: u64,
    /// Byte offset just past the last record that decoded cleanly
    valid_len: u64,
}

impl RecordIter {
    fn new(path: &Path) -> Result<Self, StoreError> {
        let reader = match File::open(path) {
            Ok(f) => Some(BufReader::new(f)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            reader,
            line_number: 0,
            valid_len: 0,
        })
    }

    /// Byte offset just past the last record that decoded cleanly.
    ///
    /// Truncating the file here discards a torn tail without touching
    /// any decodable record.
    pub fn valid_len(&self) -> u64 {
        self.valid_len
    }
}

impl Iterator for RecordIter {
    type Item = Result<Record, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;

        loop {
            let mut line = String::new();
            let bytes_read = match reader.read_line(&mut line) {
                Ok(0) => return None, // EOF
                Ok(n) => n,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                self.valid_len += bytes_read as u64;
                continue;
            }

            match Record::from_line(trimmed) {
                Ok(record) => {
                    self.valid_len += bytes_read as u64;
                    return Some(Ok(record));
                }
                Err(StoreError::CorruptRecord { reason, .. }) => {
                    return Some(Err(StoreError::CorruptRecord {
                        line: self.line_number,
                        reason,
                    }));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
