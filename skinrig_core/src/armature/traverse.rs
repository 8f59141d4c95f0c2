// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchy traversal utilities.

use super::id::{BoneId, INVALID};
use super::store::BoneStore;

/// An iterator over the direct children of a bone, in parenting order.
///
/// Created by [`BoneStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a BoneStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a BoneStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = BoneId;

    fn next(&mut self) -> Option<BoneId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(BoneId(idx))
    }
}

/// An iterator from a bone up through its ancestors, starting with the bone
/// itself.
///
/// Created by [`BoneStore::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    store: &'a BoneStore,
    current: u32,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(store: &'a BoneStore, start: u32) -> Self {
        Self {
            store,
            current: start,
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = BoneId;

    fn next(&mut self) -> Option<BoneId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.parent[idx as usize];
        Some(BoneId(idx))
    }
}
