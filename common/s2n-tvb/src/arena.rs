// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::{Kind, Result},
    ops::Ops,
    pattern::Pattern,
    record::{Flags, Record},
    tvb::Tvb,
    validate::{self, Length},
};
use bytes::Bytes;
use slotmap::SlotMap;
use tracing::trace;


slotmap::new_key_type! {
    /// Names a buffer stored in an [`Arena`]
    pub struct TvbId;
}

#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) record: Record,
    pub(crate) ops: Box<dyn Ops>,
}

/// Owns every buffer derived while processing one unit of input
///
/// Buffers refer to each other by [`TvbId`] rather than by pointer. Slices handed out by the
/// pointer path borrow the arena, so no buffer can be released while any of its bytes are
/// still being looked at. A `TvbId` that outlives its buffer resolves to
/// [`Kind::Released`] instead of dangling.
#[derive(Debug, Default)]
pub struct Arena {
    pub(crate) entries: SlotMap<TvbId, Entry>,
}

impl Arena {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live buffers in the arena
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: TvbId) -> bool {
        self.entries.contains_key(id)
    }

    /// Allocates an uninitialized buffer of the kind implemented by `ops`
    ///
    /// The new buffer has all lengths set to zero and is its own data source. The kind's
    /// constructor is responsible for populating the record through [`Arena::record_mut`]
    /// and calling [`Record::finalize`].
    pub fn new_tvb<O: Ops + 'static>(&mut self, ops: O) -> TvbId {
        let ops: Box<dyn Ops> = Box::new(ops);
        let id = self.entries.insert_with_key(|id| Entry {
            record: Record::new(id),
            ops,
        });
        trace!(tvb = ?id, kind = self.entries[id].ops.name(), "allocated");
        id
    }

    #[inline]
    #[track_caller]
    pub fn record(&self, id: TvbId) -> Result<&Record> {
        Ok(&self.entry(id)?.record)
    }

    #[inline]
    #[track_caller]
    pub fn record_mut(&mut self, id: TvbId) -> Result<&mut Record> {
        let entry = self.entries.get_mut(id).ok_or(Kind::Released)?;
        Ok(&mut entry.record)
    }

    /// Returns a read-only view of an initialized buffer
    #[inline]
    #[track_caller]
    pub fn tvb(&self, id: TvbId) -> Result<Tvb<'_>> {
        self.initialized(id)?;
        Ok(Tvb::new(self, id))
    }

    /// Marks the buffer as a fragment of a reassembled payload
    #[inline]
    #[track_caller]
    pub fn set_fragment(&mut self, id: TvbId) -> Result<()> {
        self.record_mut(id)?.insert_flags(Flags::FRAGMENT);
        Ok(())
    }

    /// Returns the in-memory footprint of a buffer
    #[inline]
    #[track_caller]
    pub fn size(&self, id: TvbId) -> Result<usize> {
        let entry = self.entry(id)?;
        Ok(core::mem::size_of::<Entry>() + entry.ops.size())
    }

    /// Validates a logical range against the reported length of a buffer
    #[inline]
    #[track_caller]
    pub fn check_offset_length(
        &self,
        id: TvbId,
        offset: isize,
        length: Length,
    ) -> Result<(usize, usize)> {
        let entry = self.initialized(id)?;
        validate::check_offset_length(&entry.record, offset, length)
    }

    /// Translates a running counter into an offset from the beginning of the real data
    #[inline]
    #[track_caller]
    pub fn offset_from_real_beginning_counter(&self, id: TvbId, counter: usize) -> Result<usize> {
        let entry = self.initialized(id)?;
        entry.ops.offset(self, &entry.record, counter)
    }

    #[inline]
    #[track_caller]
    pub fn offset_from_real_beginning(&self, id: TvbId) -> Result<usize> {
        self.offset_from_real_beginning_counter(id, 0)
    }

    /// Offset of the buffer from the beginning of the real data, computed on first use
    #[track_caller]
    pub fn raw_offset(&self, id: TvbId) -> Result<usize> {
        let entry = self.initialized(id)?;

        if let Some(offset) = entry.record.raw_offset() {
            return Ok(offset);
        }

        let offset = entry.ops.offset(self, &entry.record, 0)?;
        entry.record.set_raw_offset(offset);
        Ok(offset)
    }

    /// Returns the bytes of an absolute range without copying
    ///
    /// The range must lie within the captured bytes of the buffer.
    #[track_caller]
    pub fn get_ptr_abs(&self, id: TvbId, offset: usize, len: usize) -> Result<&[u8]> {
        let entry = self.initialized(id)?;
        validate::ensure_captured(&entry.record, offset, len)?;

        if len == 0 {
            return Ok(&[]);
        }

        if let Some(data) = entry.record.real_data() {
            return data
                .get(offset..offset + len)
                .ok_or_else(|| Kind::NotCaptured.into());
        }

        entry.ops.get_ptr(self, &entry.record, offset, len)
    }

    /// Copies an absolute range into `dest`
    #[track_caller]
    pub fn copy_abs(&self, id: TvbId, offset: usize, dest: &mut [u8]) -> Result<()> {
        let entry = self.initialized(id)?;
        validate::ensure_captured(&entry.record, offset, dest.len())?;

        if dest.is_empty() {
            return Ok(());
        }

        if let Some(data) = entry.record.real_data() {
            let src = data
                .get(offset..offset + dest.len())
                .ok_or(Kind::NotCaptured)?;
            dest.copy_from_slice(src);
            return Ok(());
        }

        entry.ops.copy_into(self, &entry.record, offset, dest)
    }

    /// Scans an absolute range for `needle`
    #[track_caller]
    pub fn find_u8_abs(
        &self,
        id: TvbId,
        offset: usize,
        limit: usize,
        needle: u8,
    ) -> Result<Option<usize>> {
        let entry = self.initialized(id)?;
        validate::ensure_captured(&entry.record, offset, limit)?;

        if limit == 0 {
            return Ok(None);
        }

        if let Some(data) = entry.record.real_data() {
            let haystack = data.get(offset..offset + limit).ok_or(Kind::NotCaptured)?;
            return Ok(haystack
                .iter()
                .position(|b| *b == needle)
                .map(|idx| offset + idx));
        }

        entry
            .ops
            .find_u8(self, &entry.record, offset, limit, needle)
    }

    /// Scans an absolute range for any byte of `pattern`
    #[track_caller]
    pub fn find_pattern_abs(
        &self,
        id: TvbId,
        offset: usize,
        limit: usize,
        pattern: &Pattern,
    ) -> Result<Option<(usize, u8)>> {
        let entry = self.initialized(id)?;
        validate::ensure_captured(&entry.record, offset, limit)?;

        if limit == 0 {
            return Ok(None);
        }

        if let Some(data) = entry.record.real_data() {
            let haystack = data.get(offset..offset + limit).ok_or(Kind::NotCaptured)?;
            return Ok(pattern
                .find(haystack)
                .map(|(idx, needle)| (offset + idx, needle)));
        }

        entry
            .ops
            .find_pattern(self, &entry.record, offset, limit, pattern)
    }

    /// Returns an independent copy of an absolute range
    #[track_caller]
    pub fn clone_abs(&self, id: TvbId, offset: usize, len: usize) -> Result<Bytes> {
        let entry = self.initialized(id)?;
        validate::ensure_captured(&entry.record, offset, len)?;

        if len == 0 {
            return Ok(Bytes::new());
        }

        if let Some(data) = entry.record.real_data() {
            return Ok(data.slice(offset..offset + len));
        }

        if let Some(bytes) = entry.ops.clone_range(self, &entry.record, offset, len)? {
            debug_assert_eq!(bytes.len(), len);
            return Ok(bytes);
        }

        let mut bytes = vec![0; len];
        entry.ops.copy_into(self, &entry.record, offset, &mut bytes)?;
        Ok(bytes.into())
    }

    #[inline]
    #[track_caller]
    pub(crate) fn entry(&self, id: TvbId) -> Result<&Entry> {
        Ok(self.entries.get(id).ok_or(Kind::Released)?)
    }

    #[inline]
    #[track_caller]
    pub(crate) fn initialized(&self, id: TvbId) -> Result<&Entry> {
        let entry = self.entry(id)?;
        entry.record.assert_initialized();
        Ok(entry)
    }
}
