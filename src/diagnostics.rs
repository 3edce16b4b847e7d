//! Non-fatal diagnostic conditions and their rate-limited reporting channel.
//!
//! Diagnostics are informational: they never alter runtime masking behavior.
//! Each condition is logged once per offending identity via `tracing::warn!`
//! and re-logged only when the offender changes, not every frame.

use std::collections::HashSet;
use std::ops::BitOr;

use xxhash_rust::xxh3::Xxh3;

/// Bit set of non-fatal diagnostic conditions observed on a mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiagFlags(pub u32);

impl DiagFlags {
    /// A descendant's material uses a shader with no known masking-aware replacement.
    pub const UNSUPPORTED_SHADER: Self = Self(1 << 0);
    /// Another enabled mask encloses this one within the same sorting group.
    pub const NESTED_MASKS: Self = Self(1 << 1);
    /// The sprite source is tightly packed and cannot be sliced or tiled.
    pub const TIGHT_PACKED_SPRITE: Self = Self(1 << 2);
    /// The mask texture cannot be sampled on the CPU for hit testing.
    pub const UNREADABLE_TEXTURE: Self = Self(1 << 3);
    /// The mask node's image uses a slicing mode the engine cannot reproduce.
    pub const UNSUPPORTED_IMAGE_MODE: Self = Self(1 << 4);

    /// Return `true` when every bit of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set every bit of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear every bit of `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Return `true` when no condition is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DiagFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Stable key for one (condition, offender identity) pair.
pub(crate) fn diag_key(flag: DiagFlags, a: u64, b: u64) -> u64 {
    let mut h = Xxh3::new();
    h.update(&flag.0.to_le_bytes());
    h.update(&a.to_le_bytes());
    h.update(&b.to_le_bytes());
    h.digest()
}

/// Once-per-identity warning sink.
#[derive(Debug, Default)]
pub(crate) struct DiagSink {
    seen: HashSet<u64>,
}

impl DiagSink {
    /// Log `msg` unless this `key` was already reported.
    pub(crate) fn warn_once(&mut self, key: u64, msg: &str) {
        if self.seen.insert(key) {
            tracing::warn!(target: "scrim", "{msg}");
        }
    }

    /// Forget reported keys so changed offenders are reported again.
    pub(crate) fn reset(&mut self) {
        self.seen.clear();
    }
}
