//! Records of an SFF container
//!
//! A record is stored as two independently padded sections: a [`RecordHeader`] holding
//! the read name and clip bounds, and a [`RecordData`] block holding the flowgram,
//! flow indices, bases, and quality scores. A [`Record`] owns exactly one of each.

use std::borrow::Cow;
use std::io::{Read, Write};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};

use crate::codec::{read_padding, write_padding, Field};
use crate::error::{FormatError, Result};
use crate::CommonHeader;

/// Size of the fixed-width scalar fields of a record header in bytes
pub const SIZE_RECORD_FIXED: usize = 16;

/// Header section of a single record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordHeader {
    /// Length of the record header in bytes, as declared on disk
    pub header_len: u16,
    /// Length of the read name
    pub name_len: u16,
    /// Number of bases in the read
    pub nbases: u32,
    /// 1-based first usable base after quality trimming (0 if unset)
    pub clip_qual_left: u16,
    /// 1-based last usable base after quality trimming (0 if unset)
    pub clip_qual_right: u16,
    /// 1-based first base after the adaptor (0 if unset)
    pub clip_adapter_left: u16,
    /// 1-based last base before a trailing adaptor (0 if unset)
    pub clip_adapter_right: u16,
    /// Read name (`name_len` bytes)
    pub name: Vec<u8>,
}
impl RecordHeader {
    /// Creates a header for a read with no clip bounds set
    pub fn new(name: &[u8], nbases: u32) -> Result<Self> {
        let name_len = u16::try_from(name.len()).map_err(|_| FormatError::FieldOverflow {
            field: "read name",
            len: name.len(),
        })?;
        let mut header = Self {
            name_len,
            nbases,
            name: name.to_vec(),
            ..Default::default()
        };
        let padded = header.padded_size();
        header.header_len = u16::try_from(padded).map_err(|_| FormatError::FieldOverflow {
            field: "record header",
            len: padded,
        })?;
        Ok(header)
    }

    /// Sets the quality clip bounds
    #[must_use]
    pub fn clip_quality(mut self, left: u16, right: u16) -> Self {
        self.clip_qual_left = left;
        self.clip_qual_right = right;
        self
    }

    /// Sets the adaptor clip bounds
    #[must_use]
    pub fn clip_adapter(mut self, left: u16, right: u16) -> Self {
        self.clip_adapter_left = left;
        self.clip_adapter_right = right;
        self
    }

    pub(crate) fn read_fields<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut header = Self {
            header_len: reader.read_u16::<NativeEndian>()?,
            name_len: reader.read_u16::<NativeEndian>()?,
            nbases: reader.read_u32::<NativeEndian>()?,
            clip_qual_left: reader.read_u16::<NativeEndian>()?,
            clip_qual_right: reader.read_u16::<NativeEndian>()?,
            clip_adapter_left: reader.read_u16::<NativeEndian>()?,
            clip_adapter_right: reader.read_u16::<NativeEndian>()?,
            name: Vec::new(),
        };
        header.from_big_endian();

        header.name.resize(header.name_len as usize, 0);
        reader.read_exact(&mut header.name)?;
        read_padding(reader, header.encoded_size())?;
        Ok(header)
    }

    /// Writes the header and its padding in big-endian order
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut be = self.clone();
        be.to_big_endian();
        writer.write_u16::<NativeEndian>(be.header_len)?;
        writer.write_u16::<NativeEndian>(be.name_len)?;
        writer.write_u32::<NativeEndian>(be.nbases)?;
        writer.write_u16::<NativeEndian>(be.clip_qual_left)?;
        writer.write_u16::<NativeEndian>(be.clip_qual_right)?;
        writer.write_u16::<NativeEndian>(be.clip_adapter_left)?;
        writer.write_u16::<NativeEndian>(be.clip_adapter_right)?;
        writer.write_all(&self.name)?;
        write_padding(writer, self.encoded_size())?;
        Ok(())
    }
}

impl Field for RecordHeader {
    fn encoded_size(&self) -> usize {
        SIZE_RECORD_FIXED + self.name_len as usize
    }

    fn to_big_endian(&mut self) {
        self.header_len = self.header_len.to_be();
        self.name_len = self.name_len.to_be();
        self.nbases = self.nbases.to_be();
        self.clip_qual_left = self.clip_qual_left.to_be();
        self.clip_qual_right = self.clip_qual_right.to_be();
        self.clip_adapter_left = self.clip_adapter_left.to_be();
        self.clip_adapter_right = self.clip_adapter_right.to_be();
    }

    fn from_big_endian(&mut self) {
        self.header_len = u16::from_be(self.header_len);
        self.name_len = u16::from_be(self.name_len);
        self.nbases = u32::from_be(self.nbases);
        self.clip_qual_left = u16::from_be(self.clip_qual_left);
        self.clip_qual_right = u16::from_be(self.clip_qual_right);
        self.clip_adapter_left = u16::from_be(self.clip_adapter_left);
        self.clip_adapter_right = u16::from_be(self.clip_adapter_right);
    }
}

/// Data section of a single record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordData {
    /// Signal intensity per flow (`flow_len` values)
    pub flowgram: Vec<u16>,
    /// Flow index per base (`nbases` values)
    pub flow_index: Vec<u8>,
    /// Called bases (`nbases` bytes)
    pub bases: Vec<u8>,
    /// Quality score per base (`nbases` values)
    pub quality: Vec<u8>,
}
impl RecordData {
    /// Creates a zeroed data block sized for `flow_len` flows and `nbases` bases
    #[must_use]
    pub fn new(flow_len: u16, nbases: u32) -> Self {
        Self {
            flowgram: vec![0; flow_len as usize],
            flow_index: vec![0; nbases as usize],
            bases: vec![0; nbases as usize],
            quality: vec![0; nbases as usize],
        }
    }

    /// Fills the block in place from the reader, consuming the trailing padding
    pub(crate) fn read_into<R: Read>(&mut self, reader: &mut R) -> std::io::Result<()> {
        reader.read_exact(bytemuck::cast_slice_mut(&mut self.flowgram))?;
        reader.read_exact(&mut self.flow_index)?;
        reader.read_exact(&mut self.bases)?;
        reader.read_exact(&mut self.quality)?;
        self.from_big_endian();
        read_padding(reader, self.encoded_size())
    }

    /// Writes the block and its padding in big-endian order
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut be = self.clone();
        be.to_big_endian();
        writer.write_all(bytemuck::cast_slice(&be.flowgram))?;
        writer.write_all(&self.flow_index)?;
        writer.write_all(&self.bases)?;
        writer.write_all(&self.quality)?;
        write_padding(writer, self.encoded_size())?;
        Ok(())
    }
}

impl Field for RecordData {
    fn encoded_size(&self) -> usize {
        2 * self.flowgram.len() + self.flow_index.len() + self.bases.len() + self.quality.len()
    }

    fn to_big_endian(&mut self) {
        self.flowgram.iter_mut().for_each(|v| *v = v.to_be());
    }

    fn from_big_endian(&mut self) {
        self.flowgram.iter_mut().for_each(|v| *v = u16::from_be(*v));
    }
}

/// A single read: one header and one data section, validated against a common header
///
/// The record exclusively owns both sections, so they are always released together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    header: RecordHeader,
    data: RecordData,
    key_len: u16,
    flow_len: u16,
}
impl Record {
    /// Assembles a record and validates it against the file's common header
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The flowgram does not hold one value per flow
    /// * The base count declared in the header disagrees with the data
    /// * The bases do not start with the common key
    pub fn new(common: &CommonHeader, header: RecordHeader, data: RecordData) -> Result<Self> {
        let name = || String::from_utf8_lossy(&header.name).into_owned();
        if data.flowgram.len() != common.flow_len as usize {
            return Err(FormatError::FlowgramLength {
                name: name(),
                expected: common.flow_len as usize,
                got: data.flowgram.len(),
            }
            .into());
        }
        if header.nbases as usize != data.bases.len() {
            return Err(FormatError::BaseCount {
                name: name(),
                expected: header.nbases as usize,
                got: data.bases.len(),
            }
            .into());
        }
        if !data.bases.starts_with(&common.key) {
            return Err(FormatError::KeyMismatch {
                name: name(),
                key: String::from_utf8_lossy(&common.key).into_owned(),
            }
            .into());
        }
        Ok(Self {
            header,
            data,
            key_len: common.key_len,
            flow_len: common.flow_len,
        })
    }

    #[must_use]
    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    #[must_use]
    pub fn data(&self) -> &RecordData {
        &self.data
    }

    #[must_use]
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.header.name)
    }

    #[must_use]
    pub fn bases(&self) -> &[u8] {
        &self.data.bases
    }

    #[must_use]
    pub fn key_len(&self) -> usize {
        self.key_len as usize
    }

    #[must_use]
    pub fn flow_len(&self) -> usize {
        self.flow_len as usize
    }

    /// 0-based index of the first base after the left clip
    ///
    /// The 1-based bound is floored at 1 so the result is never negative.
    #[must_use]
    pub fn left_clip(&self) -> usize {
        let bound = self
            .header
            .clip_qual_left
            .max(self.header.clip_adapter_left)
            .max(1);
        bound as usize - 1
    }

    /// 1-based inclusive index of the last usable base (unset bounds mean the full read)
    #[must_use]
    pub fn right_clip(&self) -> usize {
        let nbases = self.header.nbases;
        let or_full = |bound: u16| {
            if bound == 0 {
                nbases
            } else {
                u32::from(bound)
            }
        };
        or_full(self.header.clip_qual_right).min(or_full(self.header.clip_adapter_right)) as usize
    }

    /// Bases between the key and the left clip, limited to `len` bases
    ///
    /// The fragment is shorter than `len` when the left clip falls before `key_len + len`,
    /// and empty when the left clip falls inside the key.
    #[must_use]
    pub fn adaptor_fragment(&self, len: usize) -> &[u8] {
        let start = self.key_len();
        let end = self
            .left_clip()
            .min(len + start)
            .min(self.data.bases.len());
        if end <= start {
            return &[];
        }
        &self.data.bases[start..end]
    }

    /// Releases both sections together
    #[must_use]
    pub fn into_parts(self) -> (RecordHeader, RecordData) {
        (self.header, self.data)
    }
}
