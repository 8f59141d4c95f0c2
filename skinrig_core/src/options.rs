// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generation options.

/// Tunables for one generation pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationOptions {
    /// Control nodes whose points are closer than this are merge candidates.
    pub merge_epsilon: f64,
    /// An offset mechanism reuses its parent's bone when the bone head is
    /// closer than this to the control point.
    pub reuse_epsilon: f64,
    /// Parent every generated bone left without a parent to the root bone.
    pub auto_parent_to_root: bool,
}

impl GenerationOptions {
    /// Default tolerances with root auto-parenting.
    pub const STANDARD: Self = Self {
        merge_epsilon: 1e-5,
        reuse_epsilon: 1e-5,
        auto_parent_to_root: true,
    };

    /// Same as [`STANDARD`](Self::STANDARD) but leaves parentless bones
    /// alone, which keeps test armatures easy to inspect.
    pub const DETACHED: Self = Self {
        auto_parent_to_root: false,
        ..Self::STANDARD
    };

    /// Returns a copy with a different merge tolerance.
    #[must_use]
    pub const fn with_merge_epsilon(mut self, epsilon: f64) -> Self {
        self.merge_epsilon = epsilon;
        self
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = GenerationOptions::default();
        assert_eq!(o.merge_epsilon, 1e-5);
        assert_eq!(o.reuse_epsilon, 1e-5);
        assert!(o.auto_parent_to_root);
        assert!(!GenerationOptions::DETACHED.auto_parent_to_root);
        assert_eq!(o.with_merge_epsilon(0.01).merge_epsilon, 0.01);
    }
}
