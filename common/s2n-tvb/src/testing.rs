// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::{Arena, Length, Tvb, TvbId};

pub fn init_tracing() {
    if cfg!(any(miri, fuzzing)) {
        return;
    }

    use std::sync::Once;

    static TRACING: Once = Once::new();

    // make sure this only gets initialized once
    TRACING.call_once(|| {
        let format = tracing_subscriber::fmt::format().compact();

        let default_level = if std::env::var("CI").is_ok() {
            // The CI runs out of memory if we log too much tracing data
            tracing::Level::INFO
        } else if cfg!(debug_assertions) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        };

        let env_filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(default_level.into())
            .with_env_var("S2N_LOG")
            .from_env_lossy();

        // another test harness may have already installed a subscriber
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .event_format(format)
            .with_test_writer()
            .try_init();
    });
}

/// Returns `len` bytes of a repeating, recognizable pattern
pub fn pattern(len: usize) -> Vec<u8> {
    (0u8..=u8::MAX).cycle().take(len).collect()
}

/// Reads every captured byte of a buffer through the copy path
pub fn captured_bytes(tvb: &Tvb) -> Vec<u8> {
    tvb.to_vec(0, Length::ToEnd)
        .expect("captured bytes should always be readable")
}

/// Creates a top-level buffer over the first `captured` bytes of `data`, reporting all of it
pub fn truncated(arena: &mut Arena, data: &[u8], captured: usize) -> TvbId {
    let captured = captured.min(data.len());
    arena.new_real(data[..captured].to_vec(), data.len())
}
