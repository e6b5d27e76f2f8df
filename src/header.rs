//! Common header of an SFF container
//!
//! The common header opens every SFF file. It identifies the format, declares the
//! number of records that follow, and carries the flow and key sequences shared by
//! every record in the file.

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::codec::{read_padding, write_padding, Field, MAGIC, VERSION};
use crate::error::{FormatError, ReadError, Result};

/// Size of the fixed-width scalar fields of the common header in bytes
pub const SIZE_COMMON_FIXED: usize = 31;

/// Flowgram format code for 16-bit unsigned flowgram values
pub const FLOWGRAM_FORMAT_U16: u8 = 1;

/// Builder for [`CommonHeader`] instances with consistent lengths
#[derive(Debug, Clone, Default)]
pub struct CommonHeaderBuilder {
    flow: Option<Vec<u8>>,
    key: Option<Vec<u8>>,
    nreads: u32,
    index_offset: u64,
    index_len: u32,
}
impl CommonHeaderBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn flow(mut self, flow: &[u8]) -> Self {
        self.flow = Some(flow.to_vec());
        self
    }
    #[must_use]
    pub fn key(mut self, key: &[u8]) -> Self {
        self.key = Some(key.to_vec());
        self
    }
    #[must_use]
    pub fn nreads(mut self, nreads: u32) -> Self {
        self.nreads = nreads;
        self
    }
    #[must_use]
    pub fn index(mut self, offset: u64, len: u32) -> Self {
        self.index_offset = offset;
        self.index_len = len;
        self
    }
    pub fn build(self) -> Result<CommonHeader> {
        let flow = self.flow.unwrap_or_default();
        let key = self.key.unwrap_or_default();
        let flow_len = u16::try_from(flow.len()).map_err(|_| FormatError::FieldOverflow {
            field: "flow",
            len: flow.len(),
        })?;
        let key_len = u16::try_from(key.len()).map_err(|_| FormatError::FieldOverflow {
            field: "key",
            len: key.len(),
        })?;
        let mut header = CommonHeader {
            magic: MAGIC,
            version: VERSION,
            index_offset: self.index_offset,
            index_len: self.index_len,
            nreads: self.nreads,
            header_len: 0,
            key_len,
            flow_len,
            flowgram_format: FLOWGRAM_FORMAT_U16,
            flow,
            key,
        };
        let padded = header.padded_size();
        header.header_len = u16::try_from(padded).map_err(|_| FormatError::FieldOverflow {
            field: "common header",
            len: padded,
        })?;
        Ok(header)
    }
}

/// Common header of an SFF container
///
/// Field values are always held in host byte order; the big-endian representation
/// only exists transiently while a header is being decoded or encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonHeader {
    /// Magic number identifying the format
    ///
    /// 4 bytes
    pub magic: u32,

    /// Version tag of the format
    ///
    /// 4 bytes
    pub version: [u8; 4],

    /// Offset of the optional index section (passed through unmodified)
    ///
    /// 8 bytes
    pub index_offset: u64,

    /// Length of the optional index section (passed through unmodified)
    ///
    /// 4 bytes
    pub index_len: u32,

    /// Number of records in the file
    ///
    /// 4 bytes
    pub nreads: u32,

    /// Length of the common header in bytes, as declared on disk
    ///
    /// 2 bytes
    pub header_len: u16,

    /// Length of the key sequence
    ///
    /// 2 bytes
    pub key_len: u16,

    /// Number of flows per record
    ///
    /// 2 bytes
    pub flow_len: u16,

    /// Flowgram format code
    ///
    /// 1 byte
    pub flowgram_format: u8,

    /// Nucleotide flowed at each flow (`flow_len` bytes)
    pub flow: Vec<u8>,

    /// Key sequence prefixing every record (`key_len` bytes)
    pub key: Vec<u8>,
}
impl CommonHeader {
    /// Creates a valid header for the given flow and key sequences with no records declared
    pub fn new(flow: &[u8], key: &[u8]) -> Result<Self> {
        CommonHeaderBuilder::new().flow(flow).key(key).build()
    }

    /// Returns a copy of this header declaring `nreads` records
    #[must_use]
    pub fn with_nreads(&self, nreads: u32) -> Self {
        let mut header = self.clone();
        header.nreads = nreads;
        header
    }

    /// Checks the magic number, the version tag, and the variable-length sizes
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(FormatError::InvalidMagicNumber(self.magic).into());
        }
        if self.version != VERSION {
            return Err(FormatError::InvalidVersion(self.version).into());
        }
        if self.flow.len() != self.flow_len as usize {
            return Err(FormatError::FlowLength {
                expected: self.flow_len as usize,
                got: self.flow.len(),
            }
            .into());
        }
        if self.key.len() != self.key_len as usize {
            return Err(FormatError::KeyLength {
                expected: self.key_len as usize,
                got: self.key.len(),
            }
            .into());
        }
        Ok(())
    }

    /// Reads and validates a common header, including its trailing padding
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The stream ends before the full header could be read
    /// * The magic number or version tag is incorrect
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let mut header = Self::read_fields(reader).map_err(ReadError::TruncatedCommonHeader)?;
        header.validate()?;
        Ok(header)
    }

    fn read_fields<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let magic = reader.read_u32::<NativeEndian>()?;
        let mut version = [0u8; 4];
        reader.read_exact(&mut version)?;
        let mut header = Self {
            magic,
            version,
            index_offset: reader.read_u64::<NativeEndian>()?,
            index_len: reader.read_u32::<NativeEndian>()?,
            nreads: reader.read_u32::<NativeEndian>()?,
            header_len: reader.read_u16::<NativeEndian>()?,
            key_len: reader.read_u16::<NativeEndian>()?,
            flow_len: reader.read_u16::<NativeEndian>()?,
            flowgram_format: reader.read_u8()?,
            flow: Vec::new(),
            key: Vec::new(),
        };
        header.from_big_endian();

        header.flow.resize(header.flow_len as usize, 0);
        reader.read_exact(&mut header.flow)?;
        header.key.resize(header.key_len as usize, 0);
        reader.read_exact(&mut header.key)?;

        read_padding(reader, header.encoded_size())?;
        Ok(header)
    }

    /// Writes the header and its padding in big-endian order
    ///
    /// The header itself is left untouched; conversion happens on a private copy.
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut be = self.clone();
        be.to_big_endian();
        writer.write_u32::<NativeEndian>(be.magic)?;
        writer.write_all(&be.version)?;
        writer.write_u64::<NativeEndian>(be.index_offset)?;
        writer.write_u32::<NativeEndian>(be.index_len)?;
        writer.write_u32::<NativeEndian>(be.nreads)?;
        writer.write_u16::<NativeEndian>(be.header_len)?;
        writer.write_u16::<NativeEndian>(be.key_len)?;
        writer.write_u16::<NativeEndian>(be.flow_len)?;
        writer.write_u8(be.flowgram_format)?;
        writer.write_all(&self.flow)?;
        writer.write_all(&self.key)?;
        write_padding(writer, self.encoded_size())?;
        Ok(())
    }
}

impl Field for CommonHeader {
    fn encoded_size(&self) -> usize {
        SIZE_COMMON_FIXED + self.flow_len as usize + self.key_len as usize
    }

    fn to_big_endian(&mut self) {
        self.magic = self.magic.to_be();
        self.index_offset = self.index_offset.to_be();
        self.index_len = self.index_len.to_be();
        self.nreads = self.nreads.to_be();
        self.header_len = self.header_len.to_be();
        self.key_len = self.key_len.to_be();
        self.flow_len = self.flow_len.to_be();
    }

    fn from_big_endian(&mut self) {
        self.magic = u32::from_be(self.magic);
        self.index_offset = u64::from_be(self.index_offset);
        self.index_len = u32::from_be(self.index_len);
        self.nreads = u32::from_be(self.nreads);
        self.header_len = u16::from_be(self.header_len);
        self.key_len = u16::from_be(self.key_len);
        self.flow_len = u16::from_be(self.flow_len);
    }
}
