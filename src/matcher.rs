//! Classification of records by their leading adaptor
//!
//! A record is matched against the [`AdaptorTable`] in two passes. The exact pass looks
//! up the fragment following the key in each length bucket. If it finds nothing and a
//! mismatch budget is configured, the fuzzy pass aligns the fragment against every
//! adaptor and keeps the closest one within budget.

use crate::adaptors::AdaptorTable;
use crate::align::edit_distance;
use crate::error::{ConfigError, Result};
use crate::Record;

/// Output name given to records that match no adaptor
pub const UNMATCHED: &str = "unmatched";

/// Outcome of matching a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptorMatch<'a> {
    /// The fragment equals an adaptor sequence
    Exact(&'a str),
    /// The closest adaptor within the mismatch budget
    Fuzzy { name: &'a str, distance: usize },
    /// No adaptor within budget
    Unmatched,
}
impl<'a> AdaptorMatch<'a> {
    /// Name of the output the record belongs to
    #[must_use]
    pub fn name(&self) -> &'a str {
        match *self {
            Self::Exact(name) | Self::Fuzzy { name, .. } => name,
            Self::Unmatched => UNMATCHED,
        }
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        !matches!(self, Self::Unmatched)
    }
}

/// Matches records against an immutable adaptor table
#[derive(Debug, Clone, Copy)]
pub struct AdaptorMatcher<'a> {
    table: &'a AdaptorTable,
    max_mismatch: usize,
}
impl<'a> AdaptorMatcher<'a> {
    /// # Errors
    ///
    /// Returns [`ConfigError::NegativeMismatch`] if `max_mismatch` is negative.
    pub fn new(table: &'a AdaptorTable, max_mismatch: i32) -> Result<Self> {
        let max_mismatch = usize::try_from(max_mismatch)
            .map_err(|_| ConfigError::NegativeMismatch(max_mismatch))?;
        Ok(Self {
            table,
            max_mismatch,
        })
    }

    #[must_use]
    pub fn max_mismatch(&self) -> usize {
        self.max_mismatch
    }

    #[must_use]
    pub fn table(&self) -> &'a AdaptorTable {
        self.table
    }

    /// Classifies a record by the adaptor found right after its key
    #[must_use]
    pub fn classify(&self, record: &Record) -> AdaptorMatch<'a> {
        if let Some(name) = self.exact(record) {
            return AdaptorMatch::Exact(name);
        }
        if self.max_mismatch > 0 {
            if let Some((name, distance)) = self.closest(record) {
                if distance <= self.max_mismatch {
                    return AdaptorMatch::Fuzzy { name, distance };
                }
            }
        }
        AdaptorMatch::Unmatched
    }

    /// Exact lookup in every bucket whose full-length fragment is available
    fn exact(&self, record: &Record) -> Option<&'a str> {
        self.table.buckets().find_map(|(len, bucket)| {
            let fragment = record.adaptor_fragment(len);
            if fragment.len() < len {
                return None;
            }
            bucket.get(fragment)
        })
    }

    /// Closest adaptor by edit distance, keeping the first one on ties
    fn closest(&self, record: &Record) -> Option<(&'a str, usize)> {
        let mut best: Option<(&'a str, usize)> = None;
        for (len, bucket) in self.table.buckets() {
            let fragment = record.adaptor_fragment(len);
            for adaptor in bucket.iter() {
                let distance = edit_distance(fragment, &adaptor.sequence);
                if best.map_or(true, |(_, min)| distance < min) {
                    best = Some((adaptor.name.as_str(), distance));
                }
            }
        }
        best
    }
}
