use std::path::PathBuf;

/// Custom Result type for sffsplit operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the sffsplit library, encompassing every fatal condition
/// that can occur while decoding, classifying, or writing SFF containers.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Structural problems with the container (bad magic, version, or size invariants)
    FormatError(#[from] FormatError),
    /// Errors that occur while decoding the input container
    ReadError(#[from] ReadError),
    /// Errors that occur while writing an output container
    WriteError(#[from] WriteError),
    /// Disagreement between the declared and the observed number of records
    CountError(#[from] CountError),
    /// Invalid run configuration
    ConfigError(#[from] ConfigError),
    /// Errors related to the adaptor list
    AdaptorError(#[from] AdaptorError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
}

/// Errors raised when a decoded structure violates the SFF layout
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// The magic number in the common header does not match `.sff`
    ///
    /// # Arguments
    /// * `u32` - The invalid magic number that was found
    #[error("Invalid magic number: {0:#010x} (expected {expected:#010x})", expected = crate::MAGIC)]
    InvalidMagicNumber(u32),

    /// The 4-byte version tag is not supported
    ///
    /// # Arguments
    /// * `[u8; 4]` - The version bytes that were found
    #[error("Invalid format version: {0:02x?} (expected {expected:02x?})", expected = crate::VERSION)]
    InvalidVersion([u8; 4]),

    /// The flow sequence length disagrees with the header's `flow_len`
    #[error("Flow sequence holds {got} bytes but the header declares {expected}")]
    FlowLength { expected: usize, got: usize },

    /// The key sequence length disagrees with the header's `key_len`
    #[error("Key sequence holds {got} bytes but the header declares {expected}")]
    KeyLength { expected: usize, got: usize },

    /// The record flowgram does not hold one value per flow
    #[error("Record {name} has {got} flowgram values but the file declares {expected} flows")]
    FlowgramLength {
        name: String,
        expected: usize,
        got: usize,
    },

    /// The record header's base count disagrees with the decoded bases
    #[error("Record {name} declares {expected} bases but holds {got}")]
    BaseCount {
        name: String,
        expected: usize,
        got: usize,
    },

    /// The record bases do not begin with the file's key sequence
    #[error("Record {name} does not start with the expected key {key}")]
    KeyMismatch { name: String, key: String },

    /// A length does not fit in its on-disk field
    #[error("{field} of length {len} does not fit in its on-disk field")]
    FieldOverflow { field: &'static str, len: usize },
}

/// Errors that can occur while reading an SFF container
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The common header could not be read in full
    #[error("I/O failure while reading the common header: {0}")]
    TruncatedCommonHeader(#[source] std::io::Error),

    /// A record section could not be read in full
    ///
    /// # Fields
    /// * `section` - The part of the record being decoded
    /// * `record` - The 0-based index of the record being decoded
    #[error("I/O failure while reading the {section} of record {record}: {source}")]
    TruncatedRecord {
        section: &'static str,
        record: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while writing an SFF container
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// A rewritten common header would not occupy the same bytes as the original one
    #[error("Common header rewrite changes its size from {written} to {requested} bytes")]
    HeaderSizeChanged { written: usize, requested: usize },

    /// A record was written before any common header
    #[error("Cannot write a record before the common header")]
    MissingHeader,

    /// The sink for an adaptor could not be opened
    #[error("Unable to open output for adaptor {name}: {source}")]
    SinkUnavailable {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

/// Errors raised when the number of records disagrees with the common header
#[derive(thiserror::Error, Debug)]
pub enum CountError {
    /// More records were found than the header declares
    #[error("Too many records in SFF file: expected {expected}, observed at least {observed}")]
    TooManyRecords { expected: usize, observed: usize },

    /// The stream ended before the declared number of records
    #[error("Incorrect number of records in SFF file: expected {expected}, read {observed}")]
    TooFewRecords { expected: usize, observed: usize },
}

/// Errors raised when the run configuration is invalid
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Maximum number of mismatches must be 0 or greater (got {0})")]
    NegativeMismatch(i32),

    #[error("Size of the record buffer must be at least 1")]
    EmptyBuffer,

    #[error("Number of threads must be at least 1")]
    NoWorkers,
}

/// Errors related to the adaptor list
#[derive(thiserror::Error, Debug)]
pub enum AdaptorError {
    /// The adaptor list could not be opened or read
    #[error("Could not open adaptor file {path} for reading: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
