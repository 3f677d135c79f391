// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Offset and length validation
//!
//! Callers address buffers with logical offsets and lengths. A negative offset counts back
//! from the end of the reported data and [`Length::ToEnd`] extends a range to the end of the
//! buffer. These functions resolve the logical values into absolute ranges in two tiers:
//!
//! * [`check_offset_length`] validates against the reported length, which allows dissection
//!   to proceed over data the capture truncated.
//! * [`ensure_captured`] validates against the captured length and is required before any
//!   bytes are touched.

use crate::{
    error::{Kind, Result},
    record::Record,
};


/// The length of a requested range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(any(test, feature = "generator"), derive(bolero_generator::TypeGenerator))]
pub enum Length {
    /// Everything from the offset to the end of the buffer
    #[default]
    ToEnd,
    Exact(usize),
}

impl Length {
    #[inline]
    pub fn exact(self) -> Option<usize> {
        match self {
            Self::ToEnd => None,
            Self::Exact(len) => Some(len),
        }
    }
}

impl From<usize> for Length {
    #[inline]
    fn from(len: usize) -> Self {
        Self::Exact(len)
    }
}

impl From<Option<usize>> for Length {
    #[inline]
    fn from(len: Option<usize>) -> Self {
        len.map_or(Self::ToEnd, Self::Exact)
    }
}

/// Resolves a possibly negative offset against the reported length
#[inline]
#[track_caller]
pub fn resolve_offset(record: &Record, offset: isize) -> Result<usize> {
    let reported = record.reported_len();

    let offset = if offset < 0 {
        reported
            .checked_sub(offset.unsigned_abs())
            .ok_or(Kind::OutOfBounds)?
    } else {
        offset as usize
    };

    // an offset equal to the reported length addresses an empty range at the end
    if offset > reported {
        return Err(Kind::OutOfBounds.into());
    }

    Ok(offset)
}

/// Validates a logical range against the reported length
///
/// Returns the absolute `(offset, length)` pair.
#[inline]
#[track_caller]
pub fn check_offset_length(
    record: &Record,
    offset: isize,
    length: Length,
) -> Result<(usize, usize)> {
    let offset = resolve_offset(record, offset)?;
    let reported = record.reported_len();

    let len = match length {
        Length::ToEnd => reported - offset,
        Length::Exact(len) => {
            let end = offset.checked_add(len).ok_or(Kind::OutOfBounds)?;
            if end > reported {
                return Err(Kind::OutOfBounds.into());
            }
            len
        }
    };

    Ok((offset, len))
}

/// Ensures an absolute range only covers bytes that were actually captured
///
/// A range past the captured bytes is classified by how far it reaches:
/// within the contained length the bytes were simply not captured; past it, the parent
/// claimed less data than this buffer reports.
#[inline]
#[track_caller]
pub fn ensure_captured(record: &Record, offset: usize, len: usize) -> Result<()> {
    let end = offset.checked_add(len).ok_or(Kind::OutOfBounds)?;

    if end <= record.captured_len() {
        return Ok(());
    }

    let kind = if end <= record.contained_len() {
        Kind::NotCaptured
    } else if record.is_fragment() {
        Kind::FragmentOutOfBounds
    } else if end <= record.reported_len() {
        Kind::ContainedOutOfBounds
    } else {
        Kind::OutOfBounds
    };

    tracing::debug!(
        tvb = ?record.id(),
        offset,
        len,
        captured = record.captured_len(),
        reported = record.reported_len(),
        error = %kind,
        "range check failed"
    );

    Err(kind.into())
}

/// Validates a logical range that is about to be read
///
/// Unlike [`check_offset_length`], [`Length::ToEnd`] extends to the end of the captured
/// bytes, since nothing past them can be read.
#[inline]
#[track_caller]
pub fn check_captured(record: &Record, offset: isize, length: Length) -> Result<(usize, usize)> {
    let (offset, len) = match length {
        Length::ToEnd => {
            let offset = resolve_offset(record, offset)?;
            (offset, record.captured_len().saturating_sub(offset))
        }
        length => check_offset_length(record, offset, length)?,
    };

    ensure_captured(record, offset, len)?;

    Ok((offset, len))
}

/// Number of captured bytes from `offset` to the end of the buffer
#[inline]
#[track_caller]
pub fn captured_remaining(record: &Record, offset: isize) -> Result<usize> {
    let (_, len) = check_captured(record, offset, Length::ToEnd)?;
    Ok(len)
}

/// Number of reported bytes from `offset` to the end of the buffer
#[inline]
#[track_caller]
pub fn reported_remaining(record: &Record, offset: isize) -> Result<usize> {
    let (_, len) = check_offset_length(record, offset, Length::ToEnd)?;
    Ok(len)
}
