// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bone identity types.

use core::fmt;

/// Sentinel value indicating "no bone" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a bone in a [`BoneStore`](super::BoneStore).
///
/// Bones are never destroyed during a generation pass, so a plain slot index
/// is enough to identify one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(pub(crate) u32);

impl BoneId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for BoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoneId({})", self.0)
    }
}

/// Bit set of armature visibility layers.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// No layers.
    pub const NONE: Self = Self(0);

    /// A mask with only layer `index` set.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 32`.
    #[must_use]
    pub const fn layer(index: u32) -> Self {
        assert!(index < 32, "layer index out of range");
        Self(1 << index)
    }

    /// Union of both masks.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether layer `index` is set.
    #[must_use]
    pub const fn contains(self, index: u32) -> bool {
        index < 32 && self.0 & (1 << index) != 0
    }

    /// Whether no layer is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for LayerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerMask({:#010x})", self.0)
    }
}
