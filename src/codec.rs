//! Shared layout contract for the three on-disk SFF structures
//!
//! Every section of an SFF container (the common header, each record header, and each
//! record data block) is stored big-endian and zero-padded to an 8-byte boundary.
//! The [`Field`] trait captures the operations the reader and writer need from each
//! structure: the size of its encoded fields and an in-place byte order conversion.

use std::io::{Read, Write};

/// Magic number identifying an SFF container: ".sff" in ASCII
#[allow(clippy::unreadable_literal)]
pub const MAGIC: u32 = 0x2e736666;

/// The only supported version tag
pub const VERSION: [u8; 4] = [0, 0, 0, 1];

/// Every section is padded to a multiple of this many bytes
pub const PADDING_SIZE: usize = 8;

/// Common size and byte order contract of the SFF sections
#[allow(clippy::wrong_self_convention)]
pub trait Field {
    /// Size of all encoded fields in bytes.
    ///
    /// This is the sum of the fixed-width scalars and the variable-length payload,
    /// not the in-memory size of the structure and not including the section padding.
    fn encoded_size(&self) -> usize;

    /// Converts every multi-byte scalar from host to big-endian order in place
    fn to_big_endian(&mut self);

    /// Converts every multi-byte scalar from big-endian to host order in place
    fn from_big_endian(&mut self);

    /// Number of zero bytes following the section on disk
    fn padding(&self) -> usize {
        padding_bytes(self.encoded_size())
    }

    /// Full on-disk size of the section including its padding
    fn padded_size(&self) -> usize {
        self.encoded_size() + self.padding()
    }
}

/// Number of zero bytes required to bring `size` up to the next multiple of 8
#[must_use]
pub fn padding_bytes(size: usize) -> usize {
    (PADDING_SIZE - (size % PADDING_SIZE)) % PADDING_SIZE
}

/// Consumes the padding that follows a section of `size` bytes
pub(crate) fn read_padding<R: Read>(reader: &mut R, size: usize) -> std::io::Result<()> {
    let mut buf = [0u8; PADDING_SIZE];
    reader.read_exact(&mut buf[..padding_bytes(size)])
}

/// Emits the zero padding that follows a section of `size` bytes
pub(crate) fn write_padding<W: Write>(writer: &mut W, size: usize) -> std::io::Result<()> {
    writer.write_all(&[0u8; PADDING_SIZE][..padding_bytes(size)])
}
