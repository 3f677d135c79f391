// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    arena::{Arena, TvbId},
    chunk::Chunk,
    error::{Kind, Result},
    pattern::Pattern,
    record::Record,
    validate::{self, Length},
};
use bytes::{Bytes, BytesMut};
use core::{fmt, mem::size_of};
use s2n_codec::{i24, i48, u24, u48, DecoderBuffer, DecoderValue};

#[cfg(test)]
mod tests;

/// A read-only view of a buffer, used by dissection code
///
/// All offsets are relative to the start of the buffer. Negative offsets count back from the
/// end of the reported data.
#[derive(Clone, Copy)]
pub struct Tvb<'a> {
    arena: &'a Arena,
    id: TvbId,
    record: &'a Record,
}

impl fmt::Debug for Tvb<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tvb")
            .field("id", &self.id)
            .field("captured_len", &self.captured_len())
            .field("reported_len", &self.reported_len())
            .field("data_source", &self.record.data_source())
            .finish()
    }
}

macro_rules! network_endian {
    ($(#[$attr:meta])* $name:ident, $ty:ty) => {
        $(#[$attr])*
        #[inline]
        #[track_caller]
        pub fn $name(&self, offset: isize) -> Result<$ty> {
            self.decode(offset, size_of::<$ty>())
        }
    };
    ($(#[$attr:meta])* $name:ident, $ty:ty, $len:expr) => {
        $(#[$attr])*
        #[inline]
        #[track_caller]
        pub fn $name(&self, offset: isize) -> Result<$ty> {
            self.decode(offset, $len)
        }
    };
}

impl<'a> Tvb<'a> {
    #[inline]
    pub(crate) fn new(arena: &'a Arena, id: TvbId) -> Self {
        let record = &arena.entries[id].record;
        Self { arena, id, record }
    }

    #[inline]
    pub fn id(&self) -> TvbId {
        self.id
    }

    #[inline]
    pub fn record(&self) -> &'a Record {
        self.record
    }

    #[inline]
    pub fn captured_len(&self) -> usize {
        self.record.captured_len()
    }

    #[inline]
    pub fn reported_len(&self) -> usize {
        self.record.reported_len()
    }

    /// Number of captured bytes from `offset` to the end
    #[inline]
    #[track_caller]
    pub fn captured_len_remaining(&self, offset: isize) -> Result<usize> {
        validate::captured_remaining(self.record, offset)
    }

    /// Number of reported bytes from `offset` to the end
    #[inline]
    #[track_caller]
    pub fn reported_len_remaining(&self, offset: isize) -> Result<usize> {
        validate::reported_remaining(self.record, offset)
    }

    /// Returns `true` if every byte of the range was captured
    #[inline]
    pub fn bytes_exist(&self, offset: isize, len: usize) -> bool {
        validate::check_captured(self.record, offset, Length::Exact(len)).is_ok()
    }

    /// Validates a range against the reported length
    #[inline]
    #[track_caller]
    pub fn check_offset_length(&self, offset: isize, length: Length) -> Result<(usize, usize)> {
        validate::check_offset_length(self.record, offset, length)
    }

    /// Returns the bytes of a range without copying
    ///
    /// Fails with [`Kind::NotAddressable`] when the buffer cannot lend the range
    /// contiguously; see [`Tvb::ensure_contiguous`] for an accessor that falls back to
    /// copying.
    #[inline]
    #[track_caller]
    pub fn get_ptr(&self, offset: isize, length: Length) -> Result<&'a [u8]> {
        let (offset, len) = validate::check_captured(self.record, offset, length)?;
        self.arena.get_ptr_abs(self.id, offset, len)
    }

    /// Returns the bytes of a range, copying them only if they are not contiguous
    #[track_caller]
    pub fn ensure_contiguous(&self, offset: isize, length: Length) -> Result<Chunk<'a>> {
        let (offset, len) = validate::check_captured(self.record, offset, length)?;

        match self.arena.get_ptr_abs(self.id, offset, len) {
            Ok(slice) => Ok(Chunk::Slice(slice)),
            Err(error) if *error.kind() == Kind::NotAddressable => {
                let mut bytes = BytesMut::zeroed(len);
                self.arena.copy_abs(self.id, offset, &mut bytes)?;
                Ok(Chunk::BytesMut(bytes))
            }
            Err(error) => Err(error),
        }
    }

    /// Copies `dest.len()` bytes starting at `offset` into `dest`
    #[inline]
    #[track_caller]
    pub fn copy_into(&self, offset: isize, dest: &mut [u8]) -> Result<()> {
        let (offset, _) = validate::check_captured(self.record, offset, Length::Exact(dest.len()))?;
        self.arena.copy_abs(self.id, offset, dest)
    }

    /// Copies a range into a newly allocated vector
    #[inline]
    #[track_caller]
    pub fn to_vec(&self, offset: isize, length: Length) -> Result<Vec<u8>> {
        let (offset, len) = validate::check_captured(self.record, offset, length)?;
        let mut bytes = vec![0; len];
        self.arena.copy_abs(self.id, offset, &mut bytes)?;
        Ok(bytes)
    }

    /// Returns an independent copy of a range that does not belong to any chain
    #[inline]
    #[track_caller]
    pub fn clone_range(&self, offset: isize, length: Length) -> Result<Bytes> {
        let (offset, len) = validate::check_captured(self.record, offset, length)?;
        self.arena.clone_abs(self.id, offset, len)
    }

    /// Returns the offset of the first `needle` at or after `offset`
    ///
    /// At most `max_len` bytes are searched; the search never extends past the captured
    /// bytes.
    #[track_caller]
    pub fn find_u8(&self, offset: isize, max_len: Length, needle: u8) -> Result<Option<usize>> {
        let (offset, limit) = self.search_range(offset, max_len)?;
        self.arena.find_u8_abs(self.id, offset, limit, needle)
    }

    /// Returns the offset of the first byte at or after `offset` that matches `pattern`,
    /// along with the byte that matched
    #[track_caller]
    pub fn find_pattern(
        &self,
        offset: isize,
        max_len: Length,
        pattern: &Pattern,
    ) -> Result<Option<(usize, u8)>> {
        let (offset, limit) = self.search_range(offset, max_len)?;
        self.arena.find_pattern_abs(self.id, offset, limit, pattern)
    }

    #[inline]
    #[track_caller]
    fn search_range(&self, offset: isize, max_len: Length) -> Result<(usize, usize)> {
        let (offset, remaining) = validate::check_captured(self.record, offset, Length::ToEnd)?;
        let limit = max_len.exact().map_or(remaining, |max| max.min(remaining));
        Ok((offset, limit))
    }

    /// Decodes a value that spans exactly `len` bytes at `offset`
    #[track_caller]
    pub fn decode<T>(&self, offset: isize, len: usize) -> Result<T>
    where
        T: for<'b> DecoderValue<'b>,
    {
        let chunk = self.ensure_contiguous(offset, Length::Exact(len))?;
        let buffer = DecoderBuffer::new(&chunk);
        let (value, remaining) = buffer.decode::<T>().map_err(|_| Kind::Decode)?;
        remaining.ensure_empty().map_err(|_| Kind::Decode)?;
        Ok(value)
    }

    network_endian!(get_u8, u8);
    network_endian!(get_i8, i8);
    network_endian!(
        /// Reads a network-order `u16`
        get_u16,
        u16
    );
    network_endian!(get_i16, i16);
    network_endian!(
        /// Reads a network-order 24-bit integer
        get_u24,
        u24,
        3
    );
    network_endian!(get_i24, i24, 3);
    network_endian!(get_u32, u32);
    network_endian!(get_i32, i32);
    network_endian!(get_u48, u48, 6);
    network_endian!(get_i48, i48, 6);
    network_endian!(get_u64, u64);
    network_endian!(get_i64, i64);

    /// Offset of the buffer from the beginning of the real data it was derived from
    #[inline]
    #[track_caller]
    pub fn raw_offset(&self) -> Result<usize> {
        self.arena.raw_offset(self.id)
    }

    #[inline]
    #[track_caller]
    pub fn offset_from_real_beginning(&self) -> Result<usize> {
        self.arena.offset_from_real_beginning(self.id)
    }
}
