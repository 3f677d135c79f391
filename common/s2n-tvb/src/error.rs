// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use core::{fmt, panic::Location};

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// An error returned by a buffer access
///
/// The error records the call site that produced it so dissectors can tell which
/// accessor gave up on a truncated or malformed packet.
#[derive(Clone, Copy)]
pub struct Error {
    kind: Kind,
    location: &'static Location<'static>,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("crate", &"s2n-tvb")
            .field("file", &self.file())
            .field("line", &self.location.line())
            .finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Self { kind, location } = self;
        let file = self.file();
        let line = location.line();
        write!(f, "[s2n-tvb::{file}:{line}]: {kind}")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl Error {
    #[track_caller]
    #[inline]
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            location: Location::caller(),
        }
    }

    #[inline]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    #[inline]
    fn file(&self) -> &'static str {
        self.location
            .file()
            .trim_start_matches(concat!(env!("CARGO_MANIFEST_DIR"), "/src/"))
    }
}

impl PartialEq<Kind> for Error {
    #[inline]
    fn eq(&self, other: &Kind) -> bool {
        self.kind.eq(other)
    }
}

impl From<Kind> for Error {
    #[track_caller]
    #[inline]
    fn from(kind: Kind) -> Self {
        Self::new(kind)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Kind {
    /// The range lies outside of the length the data claims to have
    #[error("the requested range is outside of the reported length")]
    OutOfBounds,
    /// The range exists according to the reported length but was cut short by the capture
    #[error("the requested range was not captured")]
    NotCaptured,
    /// The range lies past the length the parent buffer claimed for this sub-range
    #[error("the requested range extends past the length claimed by the parent buffer")]
    ContainedOutOfBounds,
    /// The range lies past the end of a reassembly fragment
    #[error("the requested range extends past the end of the fragment")]
    FragmentOutOfBounds,
    /// The bytes are not contiguous and must be copied instead
    #[error("the requested range is not directly addressable")]
    NotAddressable,
    /// The buffer was released along with its chain
    #[error("the buffer has been released")]
    Released,
    /// The buffers do not trace back to the same data source
    #[error("the buffers belong to different data sources")]
    DataSourceMismatch,
    #[error("could not decode value")]
    Decode,
}

impl Kind {
    /// Returns `true` if the range was valid for the claimed data but the bytes are missing
    #[inline]
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Self::NotCaptured | Self::ContainedOutOfBounds | Self::FragmentOutOfBounds
        )
    }

    /// Returns `true` if the range can never be valid for the buffer
    #[inline]
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds)
    }
}

#[cfg(feature = "std")]
impl From<Error> for std::io::Error {
    #[inline]
    fn from(error: Error) -> Self {
        let kind = if error.kind().is_truncation() {
            std::io::ErrorKind::UnexpectedEof
        } else {
            std::io::ErrorKind::InvalidInput
        };
        Self::new(kind, error)
    }
}
