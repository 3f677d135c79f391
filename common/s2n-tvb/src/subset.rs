// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    arena::{Arena, TvbId},
    error::Result,
    ops::Ops,
    pattern::Pattern,
    record::{Flags, Lengths, Record},
    validate::{self, Length},
};
use bytes::Bytes;


/// A view on a range of a backing buffer
///
/// Every payload operation is forwarded to the backing buffer, shifted by `offset`.
#[derive(Clone, Copy, Debug)]
pub struct Subset {
    backing: TvbId,
    offset: usize,
}

impl Subset {
    #[inline]
    pub fn backing(&self) -> TvbId {
        self.backing
    }

    /// Offset of the view inside of the backing buffer
    #[inline]
    pub fn backing_offset(&self) -> usize {
        self.offset
    }
}

impl Ops for Subset {
    #[inline]
    fn name(&self) -> &'static str {
        "subset"
    }

    #[inline]
    fn offset(&self, arena: &Arena, _record: &Record, counter: usize) -> Result<usize> {
        arena.offset_from_real_beginning_counter(self.backing, counter + self.offset)
    }

    #[inline]
    fn get_ptr<'a>(
        &'a self,
        arena: &'a Arena,
        _record: &'a Record,
        offset: usize,
        len: usize,
    ) -> Result<&'a [u8]> {
        arena.get_ptr_abs(self.backing, self.offset + offset, len)
    }

    #[inline]
    fn copy_into(
        &self,
        arena: &Arena,
        _record: &Record,
        offset: usize,
        dest: &mut [u8],
    ) -> Result<()> {
        arena.copy_abs(self.backing, self.offset + offset, dest)
    }

    #[inline]
    fn find_u8(
        &self,
        arena: &Arena,
        _record: &Record,
        offset: usize,
        limit: usize,
        needle: u8,
    ) -> Result<Option<usize>> {
        let found = arena.find_u8_abs(self.backing, self.offset + offset, limit, needle)?;
        Ok(found.map(|idx| idx - self.offset))
    }

    #[inline]
    fn find_pattern(
        &self,
        arena: &Arena,
        _record: &Record,
        offset: usize,
        limit: usize,
        pattern: &Pattern,
    ) -> Result<Option<(usize, u8)>> {
        let found = arena.find_pattern_abs(self.backing, self.offset + offset, limit, pattern)?;
        Ok(found.map(|(idx, needle)| (idx - self.offset, needle)))
    }

    #[inline]
    fn clone_range(
        &self,
        arena: &Arena,
        _record: &Record,
        offset: usize,
        len: usize,
    ) -> Result<Option<Bytes>> {
        arena
            .clone_abs(self.backing, self.offset + offset, len)
            .map(Some)
    }
}

/// Everything needed to populate the record of a new view
struct View {
    subset: Subset,
    lengths: Lengths,
    flags: Flags,
    real_data: Option<Bytes>,
    raw_offset: Option<usize>,
    /// `None` makes the view the data source of its own chain
    data_source: Option<TvbId>,
}

impl Arena {
    /// Creates a view on `backing` starting at `offset`
    ///
    /// * `offset` is validated against the reported length of `backing` and may be negative
    ///   to count back from its end.
    /// * `captured` is the number of bytes to take from the captured bytes of `backing`;
    ///   [`Length::ToEnd`] takes everything that was captured past `offset`.
    /// * `reported` is the length the new buffer claims to have; it may exceed what `backing`
    ///   reports, for example when a length field in the packet is larger than the packet.
    ///
    /// The new buffer is appended to the chain of `backing`.
    #[track_caller]
    pub fn new_subset(
        &mut self,
        backing: TvbId,
        offset: isize,
        captured: Length,
        reported: Length,
    ) -> Result<TvbId> {
        let record = &self.initialized(backing)?.record;
        let offset = validate::resolve_offset(record, offset)?;

        let reported = match reported {
            Length::ToEnd => record.reported_len() - offset,
            Length::Exact(len) => len,
        };

        let captured = match captured {
            Length::ToEnd => record.captured_len().saturating_sub(offset),
            Length::Exact(len) => {
                validate::ensure_captured(record, offset, len)?;
                len
            }
        }
        .min(reported);

        let contained = record
            .contained_len()
            .saturating_sub(offset)
            .min(reported);

        let view = View {
            subset: Subset { backing, offset },
            lengths: Lengths::new(captured, reported).with_contained(contained),
            flags: record.flags() & Flags::FRAGMENT,
            real_data: record.real_data().and_then(|data| {
                let end = offset + captured;
                (end <= data.len()).then(|| data.slice(offset..end))
            }),
            raw_offset: record.raw_offset().map(|raw| raw + offset),
            data_source: Some(record.data_source()),
        };

        let id = self.insert_view(view);
        self.add_to_chain(backing, id)?;
        Ok(id)
    }

    /// Creates a view on `backing` from `offset` that claims `reported` bytes
    ///
    /// As many of those bytes as `backing` captured are available.
    #[inline]
    #[track_caller]
    pub fn new_subset_length(
        &mut self,
        backing: TvbId,
        offset: isize,
        reported: Length,
    ) -> Result<TvbId> {
        self.new_subset(backing, offset, Length::ToEnd, reported)
    }

    /// Creates a view on everything in `backing` from `offset` to its end
    #[inline]
    #[track_caller]
    pub fn new_subset_remaining(&mut self, backing: TvbId, offset: isize) -> Result<TvbId> {
        self.new_subset(backing, offset, Length::ToEnd, Length::ToEnd)
    }

    /// Creates a buffer with its own identity over all of the bytes of `backing`
    ///
    /// The proxy is not added to the chain of `backing`; it heads a chain of its own, is
    /// its own data source and must be released separately. Buffers derived from the proxy
    /// join the proxy's chain.
    #[track_caller]
    pub fn new_proxy(&mut self, backing: TvbId) -> Result<TvbId> {
        let record = &self.initialized(backing)?.record;

        let view = View {
            subset: Subset { backing, offset: 0 },
            lengths: Lengths::new(record.captured_len(), record.reported_len())
                .with_contained(record.contained_len()),
            flags: record.flags(),
            real_data: record.real_data().cloned(),
            raw_offset: record.raw_offset(),
            data_source: None,
        };

        Ok(self.insert_view(view))
    }

    fn insert_view(&mut self, view: View) -> TvbId {
        let View {
            subset,
            lengths,
            flags,
            real_data,
            raw_offset,
            data_source,
        } = view;

        let id = self.new_tvb(subset);
        let record = &mut self.entries[id].record;
        record.insert_flags(flags);
        if let Some(data_source) = data_source {
            record.data_source = data_source;
        }
        if let Some(data) = real_data {
            record.set_real_data(data);
        }
        if let Some(raw_offset) = raw_offset {
            record.set_raw_offset(raw_offset);
        }
        record.finalize(lengths);
        id
    }
}
