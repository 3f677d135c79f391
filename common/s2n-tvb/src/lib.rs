// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub mod arena;
pub mod chain;
pub mod chunk;
pub mod composite;
pub mod error;
pub mod ops;
pub mod pattern;
pub mod real;
pub mod record;
pub mod subset;
pub mod tvb;
pub mod validate;

pub use arena::{Arena, TvbId};
pub use chunk::Chunk;
pub use error::{Error, Kind, Result};
pub use ops::Ops;
pub use pattern::Pattern;
pub use record::{Flags, Lengths, Record};
pub use tvb::Tvb;
pub use validate::Length;
