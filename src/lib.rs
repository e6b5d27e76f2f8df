mod adaptors;
mod align;
mod codec;
mod config;
mod error;
mod header;
mod matcher;
mod parallel;
mod reader;
mod record;
mod splitter;
mod writer;

pub use adaptors::{Adaptor, AdaptorTable, Bucket};
pub use align::edit_distance;
pub use codec::{padding_bytes, Field, MAGIC, PADDING_SIZE, VERSION};
pub use config::SplitConfig;
pub use error::{
    AdaptorError, ConfigError, CountError, Error, FormatError, ReadError, Result, WriteError,
};
pub use header::{CommonHeader, CommonHeaderBuilder, FLOWGRAM_FORMAT_U16, SIZE_COMMON_FIXED};
pub use matcher::{AdaptorMatch, AdaptorMatcher, UNMATCHED};
pub use parallel::{effective_threads, ordered_map};
pub use reader::{ContainerReader, RecordSet, DEFAULT_CAPACITY};
pub use record::{Record, RecordData, RecordHeader, SIZE_RECORD_FIXED};
pub use splitter::{SinkFactory, SplitOutput, SplitReport, SplitState, Splitter};
pub use writer::ContainerWriter;
