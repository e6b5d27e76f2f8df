//! SFF container writer
//!
//! Records are appended after the common header. Because the final number of records
//! of an output is only known once the input is exhausted, the common header can be
//! rewritten in place, which requires a seekable sink.

use std::io::{Seek, SeekFrom, Write};

use crate::codec::Field;
use crate::error::{Result, WriteError};
use crate::{CommonHeader, Record};

pub struct ContainerWriter<W: Write + Seek> {
    /// Inner writer
    inner: W,

    /// On-disk size of the common header once it has been written
    header_size: Option<usize>,

    /// Number of records written
    records_written: usize,
}
impl<W: Write + Seek> ContainerWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            header_size: None,
            records_written: 0,
        }
    }

    /// Writes the common header at the start of the sink
    ///
    /// May be called again once records have been written to patch the header (typically
    /// its record count). The write position is restored afterwards so further records
    /// are still appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails, or if a rewritten header would occupy a
    /// different number of bytes than the first one.
    pub fn write_common_header(&mut self, header: &CommonHeader) -> Result<()> {
        let requested = header.padded_size();
        if let Some(written) = self.header_size {
            if written != requested {
                return Err(WriteError::HeaderSizeChanged { written, requested }.into());
            }
        }

        let position = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(0))?;
        header.write_bytes(&mut self.inner)?;
        if position > requested as u64 {
            self.inner.seek(SeekFrom::Start(position))?;
        }
        self.header_size = Some(requested);
        Ok(())
    }

    /// Appends a record: its header then its data, each with its own padding
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        if self.header_size.is_none() {
            return Err(WriteError::MissingHeader.into());
        }
        record.header().write_bytes(&mut self.inner)?;
        record.data().write_bytes(&mut self.inner)?;
        self.records_written += 1;
        Ok(())
    }

    /// Number of records written so far
    #[must_use]
    pub fn written_count(&self) -> usize {
        self.records_written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flushes the sink and returns it
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.inner)
    }
}
