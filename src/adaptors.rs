//! Named adaptor sequences, bucketed by length
//!
//! The table is loaded once from a two-column text source (`name sequence` per line)
//! and is immutable afterwards, so it can be shared freely between matching threads.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};

use crate::error::{AdaptorError, Result};

/// A named adaptor sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adaptor {
    pub name: String,
    pub sequence: Vec<u8>,
}

/// All adaptors sharing one sequence length
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    /// Sequence to position in `entries`
    lookup: HashMap<Vec<u8>, usize>,

    /// Adaptors in insertion order
    entries: Vec<Adaptor>,
}
impl Bucket {
    /// Returns the name of the adaptor with exactly this sequence
    #[must_use]
    pub fn get(&self, sequence: &[u8]) -> Option<&str> {
        self.lookup
            .get(sequence)
            .map(|&idx| self.entries[idx].name.as_str())
    }

    /// Iterates the adaptors of this bucket in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Adaptor> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Adaptor sequences indexed by length for exact lookup
///
/// Buckets are enumerated in ascending sequence length.
#[derive(Debug, Clone, Default)]
pub struct AdaptorTable {
    buckets: BTreeMap<usize, Bucket>,
}
impl AdaptorTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a table from a text source of `name sequence` lines
    ///
    /// Lines that do not hold exactly two whitespace-separated tokens are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        Ok(Self::parse(reader)?)
    }

    /// Loads a table from a file of `name sequence` lines
    ///
    /// # Errors
    ///
    /// Returns [`AdaptorError::SourceUnreadable`] if the file cannot be opened or read.
    /// An empty or entirely malformed file yields an empty table.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let unreadable = |source| AdaptorError::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(unreadable)?;
        let table = Self::parse(BufReader::new(file)).map_err(unreadable)?;
        debug!(
            "Loaded {} adaptors from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    fn parse<R: BufRead>(mut reader: R) -> std::io::Result<Self> {
        let mut table = Self::new();
        let mut line = Vec::new();
        let mut line_number = 0;
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            line_number += 1;

            let mut tokens = line
                .split(u8::is_ascii_whitespace)
                .filter(|token| !token.is_empty());
            match (tokens.next(), tokens.next(), tokens.next()) {
                (None, _, _) => {}
                (Some(name), Some(sequence), None) => {
                    let name = String::from_utf8_lossy(name);
                    if !table.insert(&name, sequence) {
                        warn!("Skipping adaptor {name} on line {line_number}: duplicate sequence");
                    }
                }
                _ => warn!("Skipping malformed adaptor line {line_number}"),
            }
        }
        Ok(table)
    }

    /// Adds an adaptor to the bucket of its sequence length
    ///
    /// Returns false (and leaves the table unchanged) if the sequence is empty or
    /// already present, in which case the first name registered for it is kept.
    pub fn insert(&mut self, name: &str, sequence: &[u8]) -> bool {
        if sequence.is_empty() {
            return false;
        }
        let bucket = self.buckets.entry(sequence.len()).or_default();
        if bucket.lookup.contains_key(sequence) {
            return false;
        }
        bucket.lookup.insert(sequence.to_vec(), bucket.entries.len());
        bucket.entries.push(Adaptor {
            name: name.to_string(),
            sequence: sequence.to_vec(),
        });
        true
    }

    /// Returns the name of the adaptor with exactly this sequence
    #[must_use]
    pub fn get(&self, sequence: &[u8]) -> Option<&str> {
        self.buckets
            .get(&sequence.len())
            .and_then(|bucket| bucket.get(sequence))
    }

    /// Iterates `(length, bucket)` pairs in ascending length
    pub fn buckets(&self) -> impl Iterator<Item = (usize, &Bucket)> {
        self.buckets.iter().map(|(len, bucket)| (*len, bucket))
    }

    /// Iterates every adaptor, by ascending length then insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Adaptor> {
        self.buckets.values().flat_map(Bucket::iter)
    }

    /// Distinct adaptor lengths in ascending order
    pub fn lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.keys().copied()
    }

    /// Total number of adaptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(Bucket::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
