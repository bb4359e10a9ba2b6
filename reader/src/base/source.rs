use std::io::Cursor;

use binrw::{BinRead, BinResult};
use snafu::{OptionExt, ResultExt};

use super::{error::*, U1, U2, U4};

/// Class-file bytes, addressed by absolute offset.
///
/// Every multi-byte value of the class-file format is big-endian, and so are
/// all the reads offered here.
#[derive(Debug, Clone)]
pub struct ByteSource {
    bytes: Vec<U1>,
}

impl ByteSource {
    pub fn new(bytes: impl Into<Vec<U1>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[U1] {
        &self.bytes
    }

    /// Read `length` bytes starting at `offset`.
    pub fn read_bytes(&self, offset: U4, length: U4) -> Result<&[U1], DecodingError> {
        let start = offset as usize;
        start
            .checked_add(length as usize)
            .filter(|end| *end <= self.bytes.len())
            .map(|end| &self.bytes[start..end])
            .context(OutOfBoundsSnafu {
                offset,
                length,
                size: self.bytes.len(),
            })
    }

    pub fn read_u8(&self, offset: U4) -> Result<U1, DecodingError> {
        self.reader(offset, 1)?.read_u8()
    }

    pub fn read_u16(&self, offset: U4) -> Result<U2, DecodingError> {
        self.reader(offset, 2)?.read_u16()
    }

    pub fn read_u32(&self, offset: U4) -> Result<U4, DecodingError> {
        self.reader(offset, 4)?.read_u32()
    }

    /// Sequential reader over the `length` bytes starting at `offset`.
    pub fn reader(&self, offset: U4, length: U4) -> Result<PayloadReader<'_>, DecodingError> {
        Ok(PayloadReader::new(self.read_bytes(offset, length)?, offset))
    }

    /// Sequential reader over every byte from `offset` to the end of the data.
    pub fn reader_at(&self, offset: U4) -> Result<PayloadReader<'_>, DecodingError> {
        let length = (self.bytes.len() as U4).checked_sub(offset).context(OutOfBoundsSnafu {
            offset,
            length: 0u32,
            size: self.bytes.len(),
        })?;
        self.reader(offset, length)
    }
}

/// Big-endian sequential reader over a byte range of the class file.
///
/// Used for attribute payloads, which are decoded as a stream rather than by
/// absolute offset. The reader never reads past the range it was opened on.
#[derive(Debug, Clone)]
pub struct PayloadReader<'a> {
    cursor: Cursor<&'a [U1]>,
    /// Absolute offset of the first byte of the range, for error reporting.
    base: U4,
}

impl<'a> PayloadReader<'a> {
    pub fn new(bytes: &'a [U1], base: U4) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            base,
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> U4 {
        self.cursor.position() as U4
    }

    /// Absolute offset of the next byte.
    pub fn offset(&self) -> U4 {
        self.base.saturating_add(self.position())
    }

    /// Number of bytes left in the range.
    pub fn remaining(&self) -> U4 {
        (self.cursor.get_ref().len() as U4).saturating_sub(self.position())
    }

    /// Run a binrw parser at the current position.
    pub(crate) fn with_cursor<T>(
        &mut self,
        parse: impl FnOnce(&mut Cursor<&'a [U1]>) -> BinResult<T>,
    ) -> Result<T, DecodingError> {
        let offset = self.offset();
        parse(&mut self.cursor).context(ReadSnafu { offset })
    }

    pub fn read_u8(&mut self) -> Result<U1, DecodingError> {
        self.with_cursor(|c| U1::read_be(c))
    }

    pub fn read_u16(&mut self) -> Result<U2, DecodingError> {
        self.with_cursor(|c| U2::read_be(c))
    }

    pub fn read_u32(&mut self) -> Result<U4, DecodingError> {
        self.with_cursor(|c| U4::read_be(c))
    }

    /// Borrow the next `length` bytes and advance past them.
    pub fn read_slice(&mut self, length: U4) -> Result<&'a [U1], DecodingError> {
        let bytes: &'a [U1] = *self.cursor.get_ref();
        let start = self.position() as usize;
        let slice = start
            .checked_add(length as usize)
            .and_then(|end| bytes.get(start..end))
            .context(OutOfBoundsSnafu {
                offset: self.offset(),
                length,
                size: bytes.len(),
            })?;
        self.cursor.set_position((start + slice.len()) as u64);
        Ok(slice)
    }

    pub fn read_bytes(&mut self, length: U4) -> Result<Vec<U1>, DecodingError> {
        self.read_slice(length).map(<[U1]>::to_vec)
    }

    /// Consume every remaining byte of the range.
    pub fn read_to_end(&mut self) -> Vec<U1> {
        let bytes: &'a [U1] = *self.cursor.get_ref();
        let start = (self.position() as usize).min(bytes.len());
        self.cursor.set_position(bytes.len() as u64);
        bytes[start..].to_vec()
    }
}
