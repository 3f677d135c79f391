// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{
    arena::{Arena, TvbId},
    error::{Kind, Result},
    ops::Ops,
    record::{Lengths, Record},
    validate::Length,
};
use bytes::Bytes;
use tracing::trace;

/// A buffer over contiguous bytes
///
/// The bytes are held by the record itself, so the generic access paths never reach these
/// operations unless the record was built without any data.
#[derive(Clone, Copy, Debug, Default)]
pub struct Real;

impl Ops for Real {
    #[inline]
    fn name(&self) -> &'static str {
        "real"
    }

    #[inline]
    fn offset(&self, _arena: &Arena, _record: &Record, counter: usize) -> Result<usize> {
        Ok(counter)
    }

    #[inline]
    fn get_ptr<'a>(
        &'a self,
        _arena: &'a Arena,
        record: &'a Record,
        offset: usize,
        len: usize,
    ) -> Result<&'a [u8]> {
        let data = record.real_data().map_or(&[][..], |data| &data[..]);
        data.get(offset..offset + len)
            .ok_or_else(|| Kind::NotCaptured.into())
    }

    #[inline]
    fn copy_into(
        &self,
        arena: &Arena,
        record: &Record,
        offset: usize,
        dest: &mut [u8],
    ) -> Result<()> {
        let src = self.get_ptr(arena, record, offset, dest.len())?;
        dest.copy_from_slice(src);
        Ok(())
    }
}

impl Arena {
    /// Creates a top-level buffer over `data`
    ///
    /// `reported_len` is the length the data claims to have; all of `data` counts as
    /// captured.
    ///
    /// # Panics
    ///
    /// Panics if `data` is longer than `reported_len`.
    #[track_caller]
    pub fn new_real<D: Into<Bytes>>(&mut self, data: D, reported_len: usize) -> TvbId {
        let data = data.into();
        let lengths = Lengths::new(data.len(), reported_len);

        let id = self.new_tvb(Real);
        let record = &mut self.entries[id].record;
        record.set_real_data(data);
        record.set_raw_offset(0);
        record.finalize(lengths);
        id
    }

    /// Creates a buffer over `data` and chains it to `parent`
    ///
    /// This is used for data that was derived from the parent's bytes, such as a decrypted
    /// or decompressed payload, so it is released together with the parent.
    #[track_caller]
    pub fn new_child_real<D: Into<Bytes>>(
        &mut self,
        parent: TvbId,
        data: D,
        reported_len: usize,
    ) -> Result<TvbId> {
        // fail before allocating if the parent was released
        self.record(parent)?;
        let id = self.new_real(data, reported_len);
        self.add_to_chain(parent, id)?;
        Ok(id)
    }

    /// Creates a top-level buffer holding the bytes of a range of `id`
    ///
    /// The range is validated like any other read. The new buffer is its own data source,
    /// does not belong to the chain of `id` and reports exactly the bytes it holds.
    #[track_caller]
    pub fn clone_tvb(&mut self, id: TvbId, offset: isize, length: Length) -> Result<TvbId> {
        let bytes = self.tvb(id)?.clone_range(offset, length)?;
        let len = bytes.len();
        let clone = self.new_real(bytes, len);
        trace!(tvb = ?id, ?clone, len, "cloned");
        Ok(clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_lengths() {
        let mut arena = Arena::new();
        let id = arena.new_real(&b"abcdef"[..], 10);
        let tvb = arena.tvb(id).unwrap();

        assert_eq!(tvb.captured_len(), 6);
        assert_eq!(tvb.reported_len(), 10);
        assert_eq!(arena.record(id).unwrap().contained_len(), 10);
        assert_eq!(arena.raw_offset(id).unwrap(), 0);
        assert_eq!(arena.offset_from_real_beginning_counter(id, 7).unwrap(), 7);
        assert!(arena.size(id).unwrap() > 0);
    }

    #[test]
    #[should_panic = "captured length 6 exceeds"]
    fn data_past_reported() {
        Arena::new().new_real(&b"abcdef"[..], 4);
    }

    #[test]
    fn operations_without_data() {
        let mut arena = Arena::new();
        let id = arena.new_tvb(Real);
        arena
            .record_mut(id)
            .unwrap()
            .finalize(Lengths::new(0, 8));

        let tvb = arena.tvb(id).unwrap();
        assert_eq!(tvb.get_ptr(0, Length::Exact(0)).unwrap(), &[][..]);
        assert_eq!(
            tvb.get_ptr(0, Length::Exact(1)).unwrap_err(),
            Kind::NotCaptured
        );
        assert_eq!(tvb.to_vec(0, Length::ToEnd).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn child_real_joins_parent_chain() {
        let mut arena = Arena::new();
        let parent = arena.new_real(&b"\x01\x02\x03"[..], 3);
        let child = arena.new_child_real(parent, vec![9u8; 16], 16).unwrap();

        assert_eq!(arena.record(child).unwrap().data_source(), parent);
        assert_eq!(arena.chain(parent).collect::<Vec<_>>(), [parent, child]);
        assert_eq!(arena.free_chain(parent).unwrap(), 2);
        assert!(arena.is_empty());
    }
}
