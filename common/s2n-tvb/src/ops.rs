// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{arena::Arena, error::Result, pattern::Pattern, record::Record};
use bytes::Bytes;
use core::fmt;

/// The operations every kind of buffer implements
///
/// Generic access code only ever goes through the [`Record`] and this trait, so it never
/// assumes how a kind stores its bytes. All offsets and lengths passed to an implementation
/// have already been validated against the record's captured length and are relative to
/// the start of the record.
///
/// Kinds that delegate to other buffers reach them through the `arena` argument.
pub trait Ops: fmt::Debug {
    /// A short name of the kind, used in diagnostics
    fn name(&self) -> &'static str;

    /// Returns the in-memory footprint of the kind-specific state
    #[inline]
    fn size(&self) -> usize {
        core::mem::size_of_val(self)
    }

    /// Releases the kind-specific state
    ///
    /// This is called exactly once, right before the buffer is removed from the arena.
    #[inline]
    fn free(&mut self, record: &Record) {
        let _ = record;
    }

    /// Translates a running counter into an offset from the start of the real backing store
    fn offset(&self, arena: &Arena, record: &Record, counter: usize) -> Result<usize>;

    /// Returns the bytes of a range without copying them
    ///
    /// Kinds that cannot provide the range contiguously return
    /// [`Kind::NotAddressable`](crate::error::Kind::NotAddressable); callers are expected to
    /// fall back to [`Ops::copy_into`].
    fn get_ptr<'a>(
        &'a self,
        arena: &'a Arena,
        record: &'a Record,
        offset: usize,
        len: usize,
    ) -> Result<&'a [u8]>;

    /// Copies `dest.len()` bytes starting at `offset` into `dest`
    ///
    /// This must succeed for every captured range, contiguous or not.
    fn copy_into(&self, arena: &Arena, record: &Record, offset: usize, dest: &mut [u8])
        -> Result<()>;

    /// Returns the offset of the first `needle` in `offset..offset + limit`
    #[inline]
    fn find_u8(
        &self,
        arena: &Arena,
        record: &Record,
        offset: usize,
        limit: usize,
        needle: u8,
    ) -> Result<Option<usize>> {
        let mut bytes = vec![0; limit];
        self.copy_into(arena, record, offset, &mut bytes)?;
        Ok(bytes.iter().position(|b| *b == needle).map(|idx| offset + idx))
    }

    /// Returns the offset of the first byte in `offset..offset + limit` that matches the
    /// pattern, along with the matching byte
    #[inline]
    fn find_pattern(
        &self,
        arena: &Arena,
        record: &Record,
        offset: usize,
        limit: usize,
        pattern: &Pattern,
    ) -> Result<Option<(usize, u8)>> {
        let mut bytes = vec![0; limit];
        self.copy_into(arena, record, offset, &mut bytes)?;
        Ok(pattern
            .find(&bytes)
            .map(|(idx, needle)| (offset + idx, needle)))
    }

    /// Returns an independent copy of a range
    ///
    /// Returning `None` makes the caller copy the range with [`Ops::copy_into`].
    #[inline]
    fn clone_range(
        &self,
        arena: &Arena,
        record: &Record,
        offset: usize,
        len: usize,
    ) -> Result<Option<Bytes>> {
        let _ = (arena, record, offset, len);
        Ok(None)
    }
}
