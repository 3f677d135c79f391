// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    arena::{Arena, TvbId},
    error::{Kind, Result},
    ops::Ops,
    pattern::Pattern,
    record::{Lengths, Record},
};
use core::mem::size_of;
use std::collections::VecDeque;
use tracing::trace;


/// A buffer made of the captured bytes of several member buffers, one after another
///
/// The members are not owned; they must stay alive for as long as the composite is used.
#[derive(Clone, Debug)]
pub struct Composite {
    members: Vec<TvbId>,
    /// Offset of each member inside of the composite
    start_offsets: Vec<usize>,
    /// Offset one past the last captured byte of each member
    end_offsets: Vec<usize>,
}

/// A contiguous piece of a range that belongs to a single member
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Segment {
    member: TvbId,
    /// Offset of the piece inside of the member
    member_offset: usize,
    /// Offset of the piece inside of the composite
    offset: usize,
    len: usize,
}

impl Composite {
    #[inline]
    pub fn members(&self) -> &[TvbId] {
        &self.members
    }

    /// Index of the member holding the byte at `offset`
    #[inline]
    fn member_index(&self, offset: usize) -> usize {
        self.start_offsets
            .partition_point(|start| *start <= offset)
            .saturating_sub(1)
    }

    /// Splits `offset..offset + len` into per-member pieces
    fn segments(&self, offset: usize, len: usize) -> impl Iterator<Item = Segment> + '_ {
        let end = offset + len;
        let first = self.member_index(offset);

        (first..self.members.len()).filter_map(move |idx| {
            let start = self.start_offsets[idx].max(offset);
            let stop = self.end_offsets[idx].min(end);
            (start < stop).then(|| Segment {
                member: self.members[idx],
                member_offset: start - self.start_offsets[idx],
                offset: start,
                len: stop - start,
            })
        })
    }
}

impl Ops for Composite {
    #[inline]
    fn name(&self) -> &'static str {
        "composite"
    }

    #[inline]
    fn size(&self) -> usize {
        size_of::<Self>()
            + self.members.capacity() * size_of::<TvbId>()
            + self.start_offsets.capacity() * size_of::<usize>()
            + self.end_offsets.capacity() * size_of::<usize>()
    }

    #[inline]
    fn offset(&self, arena: &Arena, _record: &Record, counter: usize) -> Result<usize> {
        match self.members.first() {
            Some(member) => arena.offset_from_real_beginning_counter(*member, counter),
            None => Ok(counter),
        }
    }

    fn get_ptr<'a>(
        &'a self,
        arena: &'a Arena,
        _record: &'a Record,
        offset: usize,
        len: usize,
    ) -> Result<&'a [u8]> {
        let mut segments = self.segments(offset, len);

        match (segments.next(), segments.next()) {
            (Some(segment), None) if segment.len == len => {
                arena.get_ptr_abs(segment.member, segment.member_offset, len)
            }
            _ => Err(Kind::NotAddressable.into()),
        }
    }

    fn copy_into(
        &self,
        arena: &Arena,
        _record: &Record,
        offset: usize,
        dest: &mut [u8],
    ) -> Result<()> {
        let mut copied = 0;

        for segment in self.segments(offset, dest.len()) {
            let target = &mut dest[segment.offset - offset..][..segment.len];
            arena.copy_abs(segment.member, segment.member_offset, target)?;
            copied += segment.len;
        }

        if copied != dest.len() {
            return Err(Kind::NotCaptured.into());
        }

        Ok(())
    }

    fn find_u8(
        &self,
        arena: &Arena,
        _record: &Record,
        offset: usize,
        limit: usize,
        needle: u8,
    ) -> Result<Option<usize>> {
        for segment in self.segments(offset, limit) {
            let found =
                arena.find_u8_abs(segment.member, segment.member_offset, segment.len, needle)?;
            if let Some(idx) = found {
                return Ok(Some(segment.offset + idx - segment.member_offset));
            }
        }

        Ok(None)
    }

    fn find_pattern(
        &self,
        arena: &Arena,
        _record: &Record,
        offset: usize,
        limit: usize,
        pattern: &Pattern,
    ) -> Result<Option<(usize, u8)>> {
        for segment in self.segments(offset, limit) {
            let found = arena.find_pattern_abs(
                segment.member,
                segment.member_offset,
                segment.len,
                pattern,
            )?;
            if let Some((idx, needle)) = found {
                return Ok(Some((segment.offset + idx - segment.member_offset, needle)));
            }
        }

        Ok(None)
    }
}

/// Collects the members of a composite buffer before it is finalized
#[derive(Clone, Debug, Default)]
pub struct Builder {
    members: VecDeque<TvbId>,
}

impl Builder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn append(&mut self, member: TvbId) -> &mut Self {
        self.members.push_back(member);
        self
    }

    #[inline]
    pub fn prepend(&mut self, member: TvbId) -> &mut Self {
        self.members.push_front(member);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Creates the composite buffer in `arena`
    ///
    /// The lengths of the composite are the sums of the member lengths. The composite is
    /// the data source of its own chain; its members keep theirs.
    #[track_caller]
    pub fn finalize(self, arena: &mut Arena) -> Result<TvbId> {
        let mut lengths = Lengths::default();
        let mut start_offsets = Vec::with_capacity(self.members.len());
        let mut end_offsets = Vec::with_capacity(self.members.len());

        for member in self.members.iter().copied() {
            let record = &arena.initialized(member)?.record;

            start_offsets.push(lengths.captured);
            lengths.captured = add(lengths.captured, record.captured_len())?;
            lengths.reported = add(lengths.reported, record.reported_len())?;
            lengths.contained = add(lengths.contained, record.contained_len())?;
            end_offsets.push(lengths.captured);
        }

        let composite = Composite {
            members: self.members.into(),
            start_offsets,
            end_offsets,
        };
        let members = composite.members.len();

        let id = arena.new_tvb(composite);
        arena.entries[id].record.finalize(lengths);

        trace!(tvb = ?id, members, ?lengths, "composite finalized");

        Ok(id)
    }
}

#[inline]
#[track_caller]
fn add(a: usize, b: usize) -> Result<usize> {
    Ok(a.checked_add(b).ok_or(Kind::OutOfBounds)?)
}
