//! Sequential SFF container reader
//!
//! Decodes one common header followed by a stream of records. The reader never looks
//! ahead further than the next byte (to detect the end of the stream), so records are
//! decoded strictly one at a time.

use std::io::BufRead;

use crate::error::{ReadError, Result};
use crate::{CommonHeader, Record, RecordData, RecordHeader};

/// Default number of records buffered per pipeline iteration
pub const DEFAULT_CAPACITY: usize = 100;

/// Sequential reader over an SFF byte source
#[derive(Debug)]
pub struct ContainerReader<R: BufRead> {
    /// The source of container bytes
    inner: R,

    /// Number of records decoded so far
    n_processed: usize,

    /// Set once any decode has failed
    failed: bool,
}
impl<R: BufRead> ContainerReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            n_processed: 0,
            failed: false,
        }
    }

    /// Reads and validates the common header
    ///
    /// Must be called once, before the first record.
    pub fn read_common_header(&mut self) -> Result<CommonHeader> {
        let result = CommonHeader::from_reader(&mut self.inner);
        self.failed |= result.is_err();
        result
    }

    /// Decodes the next record and validates it against the common header
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The stream ends inside the record header, the record data, or their padding
    /// * The decoded record is inconsistent with the common header
    pub fn read_record(&mut self, common: &CommonHeader) -> Result<Record> {
        let result = self.decode_record(common);
        self.failed |= result.is_err();
        result
    }

    fn decode_record(&mut self, common: &CommonHeader) -> Result<Record> {
        let record = self.n_processed;

        // nbases is only known once the header is decoded
        let header = RecordHeader::read_fields(&mut self.inner).map_err(|source| {
            ReadError::TruncatedRecord {
                section: "record header",
                record,
                source,
            }
        })?;

        let mut data = RecordData::new(common.flow_len, header.nbases);
        data.read_into(&mut self.inner)
            .map_err(|source| ReadError::TruncatedRecord {
                section: "record data",
                record,
                source,
            })?;

        let record = Record::new(common, header, data)?;
        self.n_processed += 1;
        Ok(record)
    }

    /// Returns the next record, or `None` once the source is exhausted
    pub fn next_record(&mut self, common: &CommonHeader) -> Option<Result<Record>> {
        if self.at_end() {
            return None;
        }
        Some(self.read_record(common))
    }

    /// Returns true when the underlying source holds no more bytes
    pub fn at_end(&mut self) -> bool {
        match self.inner.fill_buf() {
            Ok(buf) => buf.is_empty(),
            Err(_) => {
                self.failed = true;
                false
            }
        }
    }

    /// Returns true while the source has neither failed nor been exhausted
    pub fn is_ok(&mut self) -> bool {
        !self.failed && !self.at_end()
    }

    /// Number of records decoded so far
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.n_processed
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// A fixed-capacity buffer of records filled from a [`ContainerReader`]
#[derive(Debug, Clone)]
pub struct RecordSet {
    /// Records of the current fill, in input order
    records: Vec<Record>,

    /// Maximum number of records per fill
    capacity: usize,
}
impl RecordSet {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Replaces the buffered records with up to `capacity` new ones
    ///
    /// Records of the previous fill are released first. Returns the number of records
    /// read, which is zero only once the source is exhausted.
    pub fn fill<R: BufRead>(
        &mut self,
        reader: &mut ContainerReader<R>,
        common: &CommonHeader,
    ) -> Result<usize> {
        self.clear();
        while !self.is_full() {
            match reader.next_record(common) {
                Some(record) => self.records.push(record?),
                None => break,
            }
        }
        Ok(self.records.len())
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
impl Default for RecordSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::codec::Field;
    use crate::{Error, FormatError};
    use std::io::Cursor;

    fn common(nreads: u32) -> CommonHeader {
        CommonHeader::new(b"TACG", b"TCAG").unwrap().with_nreads(nreads)
    }

    fn encode(common: &CommonHeader, bases: &[&[u8]]) -> Vec<u8> {
        let mut buffer = Vec::new();
        common.write_bytes(&mut buffer).unwrap();
        for (idx, seq) in bases.iter().enumerate() {
            let name = format!("read{idx}");
            let header = RecordHeader::new(name.as_bytes(), seq.len() as u32).unwrap();
            let mut data = RecordData::new(common.flow_len, seq.len() as u32);
            data.bases.copy_from_slice(seq);
            data.flowgram = vec![idx as u16; common.flow_len as usize];
            header.write_bytes(&mut buffer).unwrap();
            data.write_bytes(&mut buffer).unwrap();
        }
        buffer
    }

    #[test]
    fn test_read_records() -> anyhow::Result<()> {
        let header = common(3);
        let bytes = encode(&header, &[b"TCAGAAAA", b"TCAGCC", b"TCAGGGGGGGG"]);
        let mut reader = ContainerReader::new(Cursor::new(bytes));

        let decoded = reader.read_common_header()?;
        assert_eq!(decoded, header);
        assert!(reader.is_ok());

        let mut names = Vec::new();
        while let Some(record) = reader.next_record(&decoded) {
            let record = record?;
            names.push(record.name().into_owned());
        }
        assert_eq!(names, vec!["read0", "read1", "read2"]);
        assert!(reader.at_end());
        assert!(!reader.is_ok());
        assert_eq!(reader.records_read(), 3);
        Ok(())
    }

    #[test]
    fn test_flowgram_decoded_to_host_order() -> anyhow::Result<()> {
        let header = common(2);
        let bytes = encode(&header, &[b"TCAGA", b"TCAGC"]);
        let mut reader = ContainerReader::new(Cursor::new(bytes));
        let decoded = reader.read_common_header()?;
        reader.read_record(&decoded)?;
        let second = reader.read_record(&decoded)?;
        assert_eq!(second.data().flowgram, vec![1u16; 4]);
        Ok(())
    }

    #[test]
    fn test_truncated_record_data() -> anyhow::Result<()> {
        let header = common(2);
        let mut bytes = encode(&header, &[b"TCAGAAAA", b"TCAGCC"]);
        bytes.truncate(bytes.len() - 10);
        let mut reader = ContainerReader::new(Cursor::new(bytes));
        let decoded = reader.read_common_header()?;
        reader.read_record(&decoded)?;

        let result = reader.read_record(&decoded);
        assert!(matches!(
            result,
            Err(Error::ReadError(ReadError::TruncatedRecord {
                section: "record data",
                record: 1,
                ..
            }))
        ));
        assert!(!reader.is_ok());
        Ok(())
    }

    #[test]
    fn test_truncated_record_header() -> anyhow::Result<()> {
        let header = common(1);
        let mut bytes = encode(&header, &[b"TCAGAAAA"]);
        bytes.truncate(header.padded_size() + 6);
        let mut reader = ContainerReader::new(Cursor::new(bytes));
        let decoded = reader.read_common_header()?;
        let result = reader.read_record(&decoded);
        assert!(matches!(
            result,
            Err(Error::ReadError(ReadError::TruncatedRecord {
                section: "record header",
                record: 0,
                ..
            }))
        ));
        Ok(())
    }

    #[test]
    fn test_record_without_key() -> anyhow::Result<()> {
        let header = common(1);
        let bytes = encode(&header, &[b"GGGGAAAA"]);
        let mut reader = ContainerReader::new(Cursor::new(bytes));
        let decoded = reader.read_common_header()?;
        let result = reader.read_record(&decoded);
        assert!(matches!(
            result,
            Err(Error::FormatError(FormatError::KeyMismatch { .. }))
        ));
        Ok(())
    }

    #[test]
    fn test_record_set_fill() -> anyhow::Result<()> {
        let header = common(5);
        let bytes = encode(
            &header,
            &[b"TCAGA", b"TCAGC", b"TCAGG", b"TCAGT", b"TCAGAC"],
        );
        let mut reader = ContainerReader::new(Cursor::new(bytes));
        let decoded = reader.read_common_header()?;

        let mut set = RecordSet::with_capacity(2);
        assert_eq!(set.capacity(), 2);
        assert_eq!(set.fill(&mut reader, &decoded)?, 2);
        assert!(set.is_full());
        assert_eq!(set.records()[0].name(), "read0");
        assert_eq!(set.fill(&mut reader, &decoded)?, 2);
        assert_eq!(set.records()[0].name(), "read2");
        assert_eq!(set.fill(&mut reader, &decoded)?, 1);
        assert_eq!(set.records()[0].bases(), b"TCAGAC");
        assert_eq!(set.fill(&mut reader, &decoded)?, 0);
        assert!(set.is_empty());
        Ok(())
    }

    struct FailingSource;
    impl std::io::Read for FailingSource {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk gone"))
        }
    }

    #[test]
    fn test_failing_source() {
        let mut reader = ContainerReader::new(std::io::BufReader::new(FailingSource));
        let result = reader.read_common_header();
        match result {
            Err(Error::ReadError(err @ ReadError::TruncatedCommonHeader(_))) => {
                let error_str = format!("{}", err);
                assert!(error_str.contains("I/O failure"));
                assert!(error_str.contains("disk gone"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!reader.is_ok());
    }
}
