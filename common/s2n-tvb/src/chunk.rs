// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use bytes::{Bytes, BytesMut};

/// Contiguous bytes of a requested range
///
/// Buffers that can address the range directly lend a slice; otherwise the range is copied
/// into owned storage.
#[derive(Clone, Debug)]
#[must_use = "Chunk should not be discarded"]
pub enum Chunk<'a> {
    Slice(&'a [u8]),
    BytesMut(BytesMut),
}

impl Default for Chunk<'_> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> Chunk<'a> {
    #[inline]
    pub fn empty() -> Self {
        Self::Slice(&[])
    }

    /// Returns `true` if the chunk borrows directly from the buffer
    #[inline]
    pub fn is_borrowed(&self) -> bool {
        matches!(self, Self::Slice(_))
    }

    #[inline]
    pub fn freeze(self) -> Bytes {
        match self {
            Self::Slice(v) => Bytes::copy_from_slice(v),
            Self::BytesMut(v) => v.freeze(),
        }
    }
}

impl<'a> From<&'a [u8]> for Chunk<'a> {
    #[inline]
    fn from(chunk: &'a [u8]) -> Self {
        Self::Slice(chunk)
    }
}

impl From<BytesMut> for Chunk<'_> {
    #[inline]
    fn from(chunk: BytesMut) -> Self {
        Self::BytesMut(chunk)
    }
}

impl core::ops::Deref for Chunk<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        match self {
            Self::Slice(t) => t,
            Self::BytesMut(t) => t,
        }
    }
}

impl PartialEq<[u8]> for Chunk<'_> {
    #[inline]
    fn eq(&self, other: &[u8]) -> bool {
        (**self).eq(other)
    }
}
