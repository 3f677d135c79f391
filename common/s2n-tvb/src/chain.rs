// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Grouping of buffers derived from one data source
//!
//! Every buffer belongs to exactly one chain. The chain is a forward list of [`TvbId`]s
//! threaded through the records: it carries no ownership and only exists so the buffers of a
//! derivation tree can be released together and traced back to their data source.

use crate::{
    arena::{Arena, TvbId},
    error::{Kind, Result},
};
use tracing::trace;


impl Arena {
    /// Appends `child`, along with any buffers already chained to it, to the end of the
    /// chain `parent` belongs to
    ///
    /// Every appended buffer takes on the data source of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `child` was already appended to a chain or if the two buffers are already
    /// linked through either chain.
    #[track_caller]
    pub fn add_to_chain(&mut self, parent: TvbId, child: TvbId) -> Result<()> {
        let data_source = self.record(parent)?.data_source();
        assert!(
            self.record(child)?.is_chain_head(),
            "{child:?} is already chained to another buffer"
        );

        let mut tail = parent;
        loop {
            assert_ne!(tail, child, "{child:?} is already chained to {parent:?}");
            match self.record(tail)?.chain_next {
                Some(next) => tail = next,
                None => break,
            }
        }

        // the chain headed by the child must not loop back into the parent's chain
        let mut members = vec![];
        let mut next = Some(child);
        while let Some(id) = next {
            assert_ne!(id, tail, "{parent:?} is already chained to {child:?}");
            members.push(id);
            next = self.record(id)?.chain_next;
        }

        self.record_mut(tail)?.chain_next = Some(child);
        self.record_mut(child)?.chained = true;

        for id in members {
            self.record_mut(id)?.data_source = data_source;
        }

        trace!(?parent, ?child, ?data_source, "chained");

        Ok(())
    }

    /// Iterates over `head` and every buffer chained after it, in derivation order
    #[inline]
    pub fn chain(&self, head: TvbId) -> Chain<'_> {
        Chain {
            arena: self,
            next: self.contains(head).then_some(head),
        }
    }

    /// Returns `true` if both buffers trace back to the same data source
    #[inline]
    #[track_caller]
    pub fn same_data_source(&self, a: TvbId, b: TvbId) -> Result<bool> {
        Ok(self.record(a)?.data_source() == self.record(b)?.data_source())
    }

    /// Distance in bytes from `from` to `to` within their shared data source
    #[track_caller]
    pub fn raw_offset_between(&self, from: TvbId, to: TvbId) -> Result<isize> {
        if !self.same_data_source(from, to)? {
            return Err(Kind::DataSourceMismatch.into());
        }

        let from = self.raw_offset(from)? as isize;
        let to = self.raw_offset(to)? as isize;
        Ok(to - from)
    }

    /// Releases `head` and every buffer chained after it
    ///
    /// Each buffer's [`Ops::free`](crate::ops::Ops::free) is invoked exactly once. Returns
    /// the number of released buffers.
    ///
    /// # Panics
    ///
    /// Panics if `head` was appended to another chain; only whole chains can be released.
    #[track_caller]
    pub fn free_chain(&mut self, head: TvbId) -> Result<usize> {
        assert!(
            self.record(head)?.is_chain_head(),
            "{head:?} is not the head of its chain"
        );

        let mut released = 0;
        let mut next = Some(head);
        while let Some(id) = next {
            let Some(mut entry) = self.entries.remove(id) else {
                break;
            };
            next = entry.record.chain_next;
            entry.ops.free(&entry.record);
            trace!(tvb = ?id, kind = entry.ops.name(), "released");
            released += 1;
        }

        Ok(released)
    }
}

/// Iterator over the members of a chain
#[derive(Clone, Debug)]
pub struct Chain<'a> {
    arena: &'a Arena,
    next: Option<TvbId>,
}

impl Iterator for Chain<'_> {
    type Item = TvbId;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self
            .arena
            .entries
            .get(id)
            .and_then(|entry| entry.record.chain_next);
        Some(id)
    }
}
