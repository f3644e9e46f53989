// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sequence number validation (E1.31 Sec.6.7.2).

use crate::config::SEQUENCE_WRAP_WINDOW;

/// Returns whether `new` may follow the last accepted sequence number `old`.
///
/// The difference is taken modulo 256 and read as a signed byte. Packets at or
/// slightly behind `old` are stale; anything at least [`SEQUENCE_WRAP_WINDOW`]
/// behind is taken as a wrapped counter and accepted.
///
/// ```
/// use sacn::merge::sequence::accept;
///
/// assert!(accept(10, 11));
/// assert!(!accept(10, 10));
/// assert!(accept(255, 0));
/// ```
#[inline]
#[must_use]
pub fn accept(old: u8, new: u8) -> bool {
    let delta = new.wrapping_sub(old) as i8;
    !(delta <= 0 && delta > -SEQUENCE_WRAP_WINDOW)
}
