// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::arena::TvbId;
use bytes::Bytes;
use core::cell::Cell;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Flags: u32 {
        /// The buffer holds a single fragment of a reassembled payload
        const FRAGMENT = 0x0000_0001;
    }
}

/// The three length fields of a buffer
///
/// * `captured` is the number of bytes that are actually available
/// * `reported` is the number of bytes the data claims to contain
/// * `contained` is the length the parent buffer claimed for this sub-range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "generator"), derive(bolero_generator::TypeGenerator))]
pub struct Lengths {
    pub captured: usize,
    pub reported: usize,
    pub contained: usize,
}

impl Lengths {
    /// Lengths for a buffer that was not carved out of a parent
    #[inline]
    pub const fn new(captured: usize, reported: usize) -> Self {
        Self {
            captured,
            reported,
            contained: reported,
        }
    }

    #[inline]
    pub const fn with_contained(mut self, contained: usize) -> Self {
        self.contained = contained;
        self
    }

    /// Returns `true` if the lengths satisfy the ordering every buffer must maintain
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.captured <= self.reported
            && self.captured <= self.contained
            && self.contained <= self.reported
    }
}

/// The header shared by every buffer, regardless of how its bytes are stored
#[derive(Debug)]
pub struct Record {
    id: TvbId,
    pub(crate) chain_next: Option<TvbId>,
    /// Set once the buffer has been appended to the chain of another buffer
    pub(crate) chained: bool,
    initialized: bool,
    flags: Flags,
    pub(crate) data_source: TvbId,
    real_data: Option<Bytes>,
    lengths: Lengths,
    raw_offset: Cell<Option<usize>>,
}

impl Record {
    #[inline]
    pub(crate) fn new(id: TvbId) -> Self {
        Self {
            id,
            chain_next: None,
            chained: false,
            initialized: false,
            flags: Flags::empty(),
            data_source: id,
            real_data: None,
            lengths: Lengths::default(),
            raw_offset: Cell::new(None),
        }
    }

    /// Sets the length fields and marks the record as initialized
    ///
    /// # Panics
    ///
    /// Panics if the record was already finalized, if the lengths violate
    /// `captured <= contained <= reported`, or if the materialized bytes are shorter than
    /// the captured length.
    #[track_caller]
    pub fn finalize(&mut self, lengths: Lengths) {
        assert!(!self.initialized, "{:?} was already finalized", self.id);
        assert!(
            lengths.captured <= lengths.contained,
            "captured length {} exceeds contained length {}",
            lengths.captured,
            lengths.contained
        );
        assert!(
            lengths.captured <= lengths.reported,
            "captured length {} exceeds reported length {}",
            lengths.captured,
            lengths.reported
        );
        assert!(
            lengths.contained <= lengths.reported,
            "contained length {} exceeds reported length {}",
            lengths.contained,
            lengths.reported
        );
        if let Some(data) = self.real_data.as_ref() {
            assert!(
                data.len() >= lengths.captured,
                "real data ({} bytes) is shorter than the captured length {}",
                data.len(),
                lengths.captured
            );
        }

        self.lengths = lengths;
        self.initialized = true;
    }

    #[inline]
    pub fn id(&self) -> TvbId {
        self.id
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    #[inline]
    pub fn is_fragment(&self) -> bool {
        self.flags.contains(Flags::FRAGMENT)
    }

    #[inline]
    pub fn insert_flags(&mut self, flags: Flags) {
        self.flags |= flags;
    }

    /// Returns `true` if the buffer heads its own chain
    #[inline]
    pub fn is_chain_head(&self) -> bool {
        !self.chained
    }

    /// The top-level buffer the bytes of this buffer trace back to
    #[inline]
    pub fn data_source(&self) -> TvbId {
        self.data_source
    }

    #[inline]
    pub fn captured_len(&self) -> usize {
        self.lengths.captured
    }

    #[inline]
    pub fn reported_len(&self) -> usize {
        self.lengths.reported
    }

    // only meaningful relative to the parent derivation
    #[inline]
    pub(crate) fn contained_len(&self) -> usize {
        self.lengths.contained
    }

    /// The materialized bytes of the buffer, if any
    #[inline]
    pub fn real_data(&self) -> Option<&Bytes> {
        self.real_data.as_ref()
    }

    /// Attaches the materialized bytes to the buffer
    ///
    /// # Panics
    ///
    /// Panics if the record was already finalized.
    #[track_caller]
    pub fn set_real_data(&mut self, data: Bytes) {
        assert!(
            !self.initialized,
            "real data must be attached before {:?} is finalized",
            self.id
        );
        self.real_data = Some(data);
    }

    /// Offset of this buffer from the beginning of the real backing store, if already known
    #[inline]
    pub fn raw_offset(&self) -> Option<usize> {
        self.raw_offset.get()
    }

    #[inline]
    pub(crate) fn set_raw_offset(&self, offset: usize) {
        self.raw_offset.set(Some(offset));
    }

    #[inline]
    #[track_caller]
    pub(crate) fn assert_initialized(&self) {
        assert!(self.initialized, "{:?} was accessed before being finalized", self.id);
    }
}
