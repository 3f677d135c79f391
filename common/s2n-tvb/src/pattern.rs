// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

/// A precompiled set of needle bytes
///
/// Scanning with a pattern stops at the first byte that matches any of the needles,
/// which allows searching for alternatives such as `b"\r\n"` in a single pass.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    table: [u64; 4],
}

impl Pattern {
    #[inline]
    pub const fn new(needles: &[u8]) -> Self {
        let mut table = [0u64; 4];
        let mut idx = 0;
        while idx < needles.len() {
            let byte = needles[idx];
            table[(byte >> 6) as usize] |= 1 << (byte & 0x3f);
            idx += 1;
        }
        Self { table }
    }

    #[inline]
    pub const fn contains(&self, byte: u8) -> bool {
        self.table[(byte >> 6) as usize] & (1 << (byte & 0x3f)) != 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.iter().all(|v| *v == 0)
    }

    /// Returns the position of the first matching byte along with the byte itself
    #[inline]
    pub fn find(&self, haystack: &[u8]) -> Option<(usize, u8)> {
        haystack
            .iter()
            .position(|b| self.contains(*b))
            .map(|idx| (idx, haystack[idx]))
    }

    #[inline]
    pub fn needles(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|b| self.contains(*b))
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.needles()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_needle() {
        let pattern = Pattern::new(b"\r\n");
        assert_eq!(pattern.find(b"GET / HTTP/1.1\r\n"), Some((14, b'\r')));
        assert_eq!(pattern.find(b"abc\ndef\r"), Some((3, b'\n')));
        assert_eq!(pattern.find(b"abcdef"), None);
        assert!(Pattern::new(&[]).is_empty());
    }

    #[test]
    fn matches_naive_scan() {
        bolero::check!()
            .with_type::<(Vec<u8>, Vec<u8>)>()
            .for_each(|(needles, haystack)| {
                let pattern = Pattern::new(needles);
                let expected = haystack
                    .iter()
                    .position(|b| needles.contains(b))
                    .map(|idx| (idx, haystack[idx]));
                assert_eq!(pattern.find(haystack), expected);

                let mut collected: Vec<u8> = pattern.needles().collect();
                let mut needles = needles.clone();
                needles.sort_unstable();
                needles.dedup();
                collected.sort_unstable();
                assert_eq!(collected, needles);
            });
    }
}
